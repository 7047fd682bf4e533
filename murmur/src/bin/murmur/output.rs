use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table, presets};
use murmur::api::{PostView, TokenView, UserView};
use serde::Serialize;

use crate::theme::{ICONS, THEME};

/// Output format options for CLI commands
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub no_color: bool,
}

/// Data that can be rendered as a table.
pub trait TableDisplay {
    fn to_table(&self, output: &OutputManager) -> Table;
}

pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    pub fn is_json(&self) -> bool {
        self.options.output_format == OutputFormat::Json
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        match self.options.output_format {
            OutputFormat::Json => self.json(data)?,
            OutputFormat::Table => println!("{}", data.to_table(self)),
        }
        Ok(())
    }

    pub fn json<T: Serialize>(&self, data: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(data)?);
        Ok(())
    }

    pub fn success(&self, message: &str) {
        if self.is_json() {
            return;
        }
        println!("{}", self.paint(ICONS.success, message, THEME.success));
    }

    pub fn info(&self, message: &str) {
        if self.is_json() {
            return;
        }
        println!("{}", self.paint(ICONS.info, message, THEME.info));
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.paint(ICONS.warning, message, THEME.warning));
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", self.paint(ICONS.error, message, THEME.error));
    }

    fn paint(&self, icon: &str, message: &str, color: colored::Color) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }

    /// Create a themed table
    pub fn create_table(&self) -> Table {
        let mut table = Table::new();
        if self.options.no_color {
            table.load_preset(presets::ASCII_FULL);
        } else {
            table.load_preset(presets::UTF8_FULL_CONDENSED);
        }
        table
    }

    pub fn add_table_header(&self, table: &mut Table, headers: &[&str]) {
        let cells: Vec<Cell> = headers
            .iter()
            .map(|header| {
                let cell = Cell::new(header).add_attribute(Attribute::Bold);
                if self.options.no_color {
                    cell
                } else {
                    cell.fg(TableColor::Cyan)
                }
            })
            .collect();
        table.set_header(cells);
    }

    fn key_value_table(&self, rows: Vec<(&str, String)>) -> Table {
        let mut table = self.create_table();
        for (key, value) in rows {
            let key_cell = if self.options.no_color {
                Cell::new(key).add_attribute(Attribute::Bold)
            } else {
                Cell::new(key.color(THEME.key).bold())
            };
            let value_cell = if self.options.no_color {
                Cell::new(value)
            } else {
                Cell::new(value.color(THEME.value))
            };
            table.add_row(vec![key_cell, value_cell]);
        }
        table
    }

    fn empty_table(&self, message: &str) -> Table {
        let mut table = self.create_table();
        let cell = if self.options.no_color {
            Cell::new(message)
        } else {
            Cell::new(message.color(THEME.muted))
        };
        table.add_row(vec![cell]);
        table
    }
}

fn join_ids(ids: &[String]) -> String {
    if ids.is_empty() { "-".to_string() } else { ids.join("\n") }
}

impl TableDisplay for PostView {
    fn to_table(&self, output: &OutputManager) -> Table {
        output.key_value_table(vec![
            ("id", self.id.clone()),
            ("title", self.title.clone()),
            ("content", self.content.clone()),
            ("author", self.author.clone()),
            ("published", self.published_at.to_rfc3339()),
            ("likes", format!("{} {}", ICONS.heart, self.like_count)),
            ("liked by", join_ids(&self.liked_by)),
        ])
    }
}

impl TableDisplay for Vec<PostView> {
    fn to_table(&self, output: &OutputManager) -> Table {
        if self.is_empty() {
            return output.empty_table("No posts found");
        }
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["ID", "Title", "Author", "Likes", "Published"]);
        for post in self {
            table.add_row(vec![
                Cell::new(&post.id),
                Cell::new(&post.title),
                Cell::new(&post.author),
                Cell::new(post.like_count),
                Cell::new(post.published_at.format("%Y-%m-%d %H:%M")),
            ]);
        }
        table
    }
}

impl TableDisplay for UserView {
    fn to_table(&self, output: &OutputManager) -> Table {
        output.key_value_table(vec![
            ("id", self.id.clone()),
            ("username", self.username.clone()),
            ("display name", self.display_name.clone()),
            ("email", self.email.clone()),
            ("posts", self.post_count.to_string()),
            ("followers", self.follower_count.to_string()),
            ("following", self.following_count.to_string()),
            ("following ids", join_ids(&self.following)),
        ])
    }
}

impl TableDisplay for Vec<UserView> {
    fn to_table(&self, output: &OutputManager) -> Table {
        if self.is_empty() {
            return output.empty_table("No users found");
        }
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["ID", "Username", "Display name", "Posts", "Followers", "Following"]);
        for user in self {
            table.add_row(vec![
                Cell::new(&user.id),
                Cell::new(&user.username),
                Cell::new(&user.display_name),
                Cell::new(user.post_count),
                Cell::new(user.follower_count),
                Cell::new(user.following_count),
            ]);
        }
        table
    }
}

impl TableDisplay for TokenView {
    fn to_table(&self, output: &OutputManager) -> Table {
        output.key_value_table(vec![("token", self.token.clone())])
    }
}
