//! Pure text fragments shared by every object renderer.
//!
//! Every statement-producing function returns text terminated by a blank line
//! so fragments can be concatenated directly into a script.

/// Marker prefix of tagged snippet blocks: `-- -#-{tag}`
const SNIPPET_MARK: &str = "-- -#-{";

/// Block code comment
pub fn block(comment: &str) -> String {
    format!("/*\n\n  {}\n\n*/\n\n", comment)
}

/// psql echo framed by dashes as long as the message
pub fn echo_dash(comment: &str) -> String {
    let dash = "-".repeat(comment.chars().count());
    format!("\\echo {}\n\\echo {}\n\\echo {}\n\n", dash, comment, dash)
}

pub fn echo(comment: &str) -> String {
    format!("\\echo {}\n\n", comment)
}

/// Single line code comment
pub fn comment(comment: &str) -> String {
    format!("-- {}\n\n", comment)
}

pub fn blank(n: usize) -> String {
    "\n".repeat(n)
}

pub fn begin() -> String {
    "begin;\n\n".to_string()
}

pub fn commit() -> String {
    "commit;\n\n".to_string()
}

pub fn vacuum(analyze: bool) -> String {
    format!("vacuum{};\n\n", if analyze { " analyze" } else { "" })
}

/// Escape a value for use inside a single quoted SQL literal
pub fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// `comment on <keyword> <target>` statement, empty when there is no comment
pub fn comment_on(keyword: &str, target: &str, comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!(
            "comment on {} {} is\n'{}';\n\n",
            keyword,
            target,
            quote_literal(comment)
        ),
        None => String::new(),
    }
}

/// Section header: a block comment and an echo dash, the latter defaulting to
/// the block text
pub fn header(block_comment: Option<&str>, echo_comment: Option<&str>) -> String {
    let echo_comment = echo_comment.or(block_comment);
    let mut out = String::new();

    if let Some(c) = block_comment {
        out.push_str(&block(&format!("Beginning: {}", c)));
    }
    if let Some(c) = echo_comment {
        out.push_str(&echo_dash(&format!("Beginning: {}", c)));
    }

    out
}

pub fn footer(echo_comment: Option<&str>) -> String {
    echo_comment
        .map(|c| echo_dash(&format!("Ending: {}", c)))
        .unwrap_or_default()
}

/// Wraps the start of a generated script file
pub fn script_header(file: &str) -> String {
    format!(
        "{}{}",
        block(&format!("File: {}", file)),
        echo_dash(&format!("Running script file: {}", file))
    )
}

/// Wraps the end of a generated script file
pub fn script_footer(file: &str) -> String {
    format!(
        "{}{}",
        echo_dash(&format!("Run of script file ended: {}", file)),
        block(&format!("End of file: {}", file))
    )
}

/// psql `\i` commands for one or more files
pub fn psql_include(files: &[String], path: Option<&str>) -> String {
    files
        .iter()
        .map(|file| match path {
            Some(path) => format!("\\i {}/{}\n\n", path.trim_end_matches('/'), file),
            None => format!("\\i {}\n\n", file),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyDirection {
    #[default]
    From,
    To,
}

/// Options of a psql `\copy` command
#[derive(Debug, Clone, PartialEq)]
pub struct CopyOptions {
    pub columns: Option<Vec<String>>,
    pub direction: CopyDirection,
    pub delimiter: Option<String>,
    pub csv: bool,
    pub header: bool,
    pub quote: Option<String>,
    pub encoding: Option<String>,
    pub null: Option<String>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            columns: None,
            direction: CopyDirection::From,
            delimiter: Some("|".to_string()),
            csv: true,
            header: true,
            quote: Some("\"".to_string()),
            encoding: Some("utf-8".to_string()),
            null: Some("-".to_string()),
        }
    }
}

/// psql `\copy` between a relation and a client side file
pub fn copy(relation: &str, path: &str, options: &CopyOptions) -> String {
    let columns = options
        .columns
        .as_ref()
        .map(|c| format!("({})", c.join(", ")))
        .unwrap_or_default();
    let direction = match options.direction {
        CopyDirection::From => "from",
        CopyDirection::To => "to",
    };

    let mut with = Vec::new();
    if let Some(delimiter) = &options.delimiter {
        with.push(format!("delimiter '{}'", quote_literal(delimiter)));
    }
    if options.csv {
        with.push("csv".to_string());
    }
    if options.header {
        with.push("header".to_string());
    }
    if let Some(quote) = &options.quote {
        with.push(format!("quote '{}'", quote_literal(quote)));
    }
    if let Some(encoding) = &options.encoding {
        with.push(format!("encoding '{}'", quote_literal(encoding)));
    }
    if let Some(null) = &options.null {
        with.push(format!("null '{}'", quote_literal(null)));
    }

    let mut out = format!(
        "\\copy {}{} {} '{}'",
        relation,
        columns,
        direction,
        quote_literal(path)
    );
    if !with.is_empty() {
        out.push_str(" with ");
        out.push_str(&with.join(" "));
    }
    out.push_str("\n\n");
    out
}

/// Select the lines of a snippet file.
///
/// Without a tag the whole text is returned minus the tag marker lines. With a
/// tag, the lines between the first `-- -#-{tag}` marker and the next one (or
/// the end of the text). Leading and trailing newlines are trimmed. Returns
/// `None` when the tag never appears.
pub fn snippet(text: &str, tag: Option<&str>) -> Option<String> {
    let marker = tag.map(|t| format!("{}{}}}", SNIPPET_MARK, t));
    let mut in_block = tag.is_none();
    let mut found = tag.is_none();
    let mut out = String::new();

    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);

        if let Some(marker) = &marker {
            if bare == marker {
                if in_block {
                    break;
                }
                in_block = true;
                found = true;
            }
        }

        if in_block && !bare.starts_with(SNIPPET_MARK) {
            out.push_str(line);
        }
    }

    found.then(|| out.trim_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_comment_fragments() {
        assert_eq!(block("This is the comment"), "/*\n\n  This is the comment\n\n*/\n\n");
        assert_eq!(
            echo_dash("This is the comment"),
            "\\echo -------------------\n\\echo This is the comment\n\\echo -------------------\n\n"
        );
        assert_eq!(echo("This is the comment"), "\\echo This is the comment\n\n");
        assert_eq!(comment("This is the comment"), "-- This is the comment\n\n");
        assert_eq!(blank(1), "\n");
        assert_eq!(blank(3), "\n\n\n");
    }

    #[test]
    fn test_transaction_helpers() {
        assert_eq!(begin(), "begin;\n\n");
        assert_eq!(commit(), "commit;\n\n");
        assert_eq!(vacuum(false), "vacuum;\n\n");
        assert_eq!(vacuum(true), "vacuum analyze;\n\n");
    }

    #[test]
    fn test_echo_dash_counts_characters() {
        assert_eq!(echo_dash("año"), "\\echo ---\n\\echo año\n\\echo ---\n\n");
    }

    #[test]
    fn test_comment_on_quotes_and_skips_missing() {
        assert_eq!(
            comment_on("role", "admin", Some("It's the admin")),
            "comment on role admin is\n'It''s the admin';\n\n"
        );
        assert_eq!(comment_on("role", "admin", None), "");
    }

    #[test]
    fn test_header_and_footer() {
        assert_eq!(
            header(Some("db0 block comment"), Some("db0 echo dash")),
            indoc! {r#"
                /*

                  Beginning: db0 block comment

                */

                \echo ------------------------
                \echo Beginning: db0 echo dash
                \echo ------------------------

            "#}
        );
        assert_eq!(header(None, None), "");
        assert!(header(Some("only block"), None).contains("\\echo Beginning: only block"));
        assert_eq!(
            footer(Some("done")),
            "\\echo ------------\n\\echo Ending: done\n\\echo ------------\n\n"
        );
    }

    #[test]
    fn test_psql_include() {
        let files = vec!["a.sql".to_string(), "b.sql".to_string()];
        assert_eq!(psql_include(&files, None), "\\i a.sql\n\n\\i b.sql\n\n");
        assert_eq!(psql_include(&files[..1], Some("builders/")), "\\i builders/a.sql\n\n");
    }

    #[test]
    fn test_copy_defaults_and_options() {
        assert_eq!(
            copy("context.municipio", "/data/m.csv", &CopyOptions::default()),
            "\\copy context.municipio from '/data/m.csv' with delimiter '|' csv header quote '\"' encoding 'utf-8' null '-'\n\n"
        );

        let options = CopyOptions {
            columns: Some(vec!["gid".into(), "geom".into()]),
            direction: CopyDirection::To,
            delimiter: None,
            csv: false,
            header: false,
            quote: None,
            encoding: None,
            null: None,
        };
        assert_eq!(
            copy("context.grid_250", "/tmp/g.csv", &options),
            "\\copy context.grid_250(gid, geom) to '/tmp/g.csv'\n\n"
        );
    }

    #[test]
    fn test_snippet_tags() {
        let text = indoc! {r#"
            -- Municipios test

            -- -#-{municipios}
            create table test_data.municipio as
            select * from context.municipio;
            -- -#-{municipios}

            -- -#-{grids}
            create table test_data.grid_250 as select 1;
        "#};

        assert_eq!(
            snippet(text, Some("municipios")).unwrap(),
            "create table test_data.municipio as\nselect * from context.municipio;"
        );
        assert_eq!(
            snippet(text, Some("grids")).unwrap(),
            "create table test_data.grid_250 as select 1;"
        );
        assert!(snippet(text, Some("missing")).is_none());

        let whole = snippet(text, None).unwrap();
        assert!(whole.starts_with("-- Municipios test"));
        assert!(!whole.contains("-#-"));
    }
}
