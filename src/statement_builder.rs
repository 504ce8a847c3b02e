// ============================================================================
// L2.3: STATEMENT BUILDER SUBSYSTEM
// ============================================================================
use crate::model::ColumnDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    SqlServer,
    MySql,
}

impl Dialect {
    /// Quotes a possibly schema-qualified name, one part at a time.
    /// Parts that already carry the dialect's quotes are kept as-is.
    pub fn quote_name(self, name: &str) -> String {
        split_name_parts(name)
            .into_iter()
            .map(|part| self.quote_part(part.trim()))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_part(self, part: &str) -> String {
        match self {
            Dialect::SqlServer => {
                if part.starts_with('[') && part.ends_with(']') && part.len() >= 2 {
                    part.to_string()
                } else {
                    format!("[{}]", part.replace(']', "]]"))
                }
            }
            Dialect::MySql => {
                if part.starts_with('`') && part.ends_with('`') && part.len() >= 2 {
                    part.to_string()
                } else {
                    format!("`{}`", part.replace('`', "``"))
                }
            }
        }
    }

    /// Placeholder for the 1-based parameter `position`.
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Dialect::SqlServer => format!("@P{}", position),
            Dialect::MySql => "?".to_string(),
        }
    }
}

/// Splits a qualified name on the dots that sit outside `[...]`, backtick
/// or double-quote delimited parts. Doubled closing quotes are escapes.
pub fn split_name_parts(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut closing: Option<char> = None;
    let mut chars = name.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match closing {
            Some(end) if c == end => {
                if chars.peek().map(|&(_, next)| next) == Some(end) {
                    chars.next();
                } else {
                    closing = None;
                }
            }
            Some(_) => {}
            None => match c {
                '[' => closing = Some(']'),
                '`' | '"' => closing = Some(c),
                '.' => {
                    parts.push(&name[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&name[start..]);
    parts
}

/// `INSERT INTO t (c1, c2) VALUES (p1, p2)` with columns in descriptor order.
pub fn build_insert(dialect: Dialect, table: &str, columns: &[ColumnDescriptor]) -> String {
    let names = columns
        .iter()
        .map(|c| dialect.quote_part(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|position| dialect.placeholder(position))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_name(table),
        names,
        placeholders
    )
}

pub fn select_all(dialect: Dialect, table: &str) -> String {
    format!("SELECT * FROM {}", dialect.quote_name(table))
}

pub fn count_rows(dialect: Dialect, table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", dialect.quote_name(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_types::SqlType;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", SqlType::Integer, 10),
            ColumnDescriptor::new("name", SqlType::NVarChar, 50),
            ColumnDescriptor::new("created at", SqlType::Timestamp, 23),
        ]
    }

    #[test]
    fn sql_server_insert_uses_numbered_parameters() {
        let sql = build_insert(Dialect::SqlServer, "dbo.Orders", &columns());
        assert_eq!(
            sql,
            "INSERT INTO [dbo].[Orders] ([id], [name], [created at]) VALUES (@P1, @P2, @P3)"
        );
    }

    #[test]
    fn mysql_insert_uses_question_marks() {
        let sql = build_insert(Dialect::MySql, "orders", &columns());
        assert_eq!(
            sql,
            "INSERT INTO `orders` (`id`, `name`, `created at`) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn quoting_escapes_and_keeps_existing_quotes() {
        assert_eq!(Dialect::SqlServer.quote_name("[dbo].Odd]Name"), "[dbo].[Odd]]Name]");
        assert_eq!(Dialect::MySql.quote_name("shop.`my table`"), "`shop`.`my table`");
        assert_eq!(Dialect::MySql.quote_name("we`ird"), "`we``ird`");
    }

    #[test]
    fn dots_inside_quoted_parts_do_not_split() {
        assert_eq!(Dialect::SqlServer.quote_name("[Order.Details]"), "[Order.Details]");
        assert_eq!(
            Dialect::SqlServer.quote_name("sales.[Order.Details]"),
            "[sales].[Order.Details]"
        );
        assert_eq!(Dialect::MySql.quote_name("`a.b`.c"), "`a.b`.`c`");
        assert_eq!(split_name_parts("[x]].y].z"), vec!["[x]].y]", "z"]);
        assert_eq!(split_name_parts("a.b.c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn builder_is_deterministic() {
        let a = build_insert(Dialect::SqlServer, "Orders", &columns());
        let b = build_insert(Dialect::SqlServer, "Orders", &columns());
        assert_eq!(a, b);
    }

    #[test]
    fn select_and_count_statements() {
        assert_eq!(select_all(Dialect::SqlServer, "Orders"), "SELECT * FROM [Orders]");
        assert_eq!(count_rows(Dialect::MySql, "orders"), "SELECT COUNT(*) FROM `orders`");
    }
}
