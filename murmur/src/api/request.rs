use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::{ErrorKind, ServiceError, ValidationIssue},
    pagination::SortOrder,
};

/// One façade operation, tagged by its `op` name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    GetPosts {
        first: u64,
        #[serde(default)]
        page: Option<i64>,
        #[serde(default)]
        order: Option<SortOrder>,
    },
    GetPost {
        id: String,
    },
    GetUser {
        id: String,
    },
    PublishPost {
        title: String,
        content: String,
    },
    LikePost {
        post_id: String,
    },
    FollowUser {
        user_id: String,
    },
    UnFollowUser {
        user_id: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
    Login {
        username: String,
        password: String,
    },
    GetUserPosts {
        user_id: String,
    },
    GetFollowers {
        user_id: String,
    },
    GetFollowing {
        user_id: String,
    },
    GetPostLikers {
        post_id: String,
    },
    GetPostAuthor {
        post_id: String,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetPosts { .. } => "getPosts",
            Request::GetPost { .. } => "getPost",
            Request::GetUser { .. } => "getUser",
            Request::PublishPost { .. } => "publishPost",
            Request::LikePost { .. } => "likePost",
            Request::FollowUser { .. } => "followUser",
            Request::UnFollowUser { .. } => "unFollowUser",
            Request::Register { .. } => "register",
            Request::Login { .. } => "login",
            Request::GetUserPosts { .. } => "getUserPosts",
            Request::GetFollowers { .. } => "getFollowers",
            Request::GetFollowing { .. } => "getFollowing",
            Request::GetPostLikers { .. } => "getPostLikers",
            Request::GetPostAuthor { .. } => "getPostAuthor",
        }
    }
}

/// A request plus the caller's credential, as received on the wire.
///
/// ```json
/// {"op": "likePost", "postId": "...", "authorization": "Bearer ..."}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub request: Request,
    #[serde(default)]
    pub authorization: Option<String>,
}

impl Envelope {
    pub fn credential(&self) -> &str {
        self.authorization.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

impl From<&ServiceError> for ErrorBody {
    fn from(err: &ServiceError) -> Self {
        let issues = match err {
            ServiceError::Validation(validation) => validation.issues.clone(),
            _ => Vec::new(),
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            issues,
        }
    }
}

/// `{"data": ...}` on success, `{"error": {"kind", "message"}}` on failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Data(Value),
    Error(ErrorBody),
}

impl Response {
    pub fn error(err: &ServiceError) -> Self {
        Response::Error(err.into())
    }

    /// Error response for an envelope that could not be parsed.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Response::Error(ErrorBody {
            kind: ErrorKind::Validation,
            message: message.into(),
            issues: Vec::new(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}
