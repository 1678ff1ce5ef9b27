//! Indented, human-readable dump of a record tree.
//!
//! Every line starts with the nesting level so deep audit records stay
//! readable in a log file:
//!
//! ```text
//!  1 user {string}: alice
//!  1 session
//!   2 id {integer}: 42
//!  1 files
//!  1   [0] {string}: a.txt
//!  1 files[1]:
//!   2 name {string}: b.txt
//! ```

use std::fmt::{self, Write};

use super::{FieldValue, RecordTree, Scalar};

impl fmt::Display for RecordTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dump_tree(f, self, 1)
    }
}

fn indent(level: usize) -> String {
    format!("{}{} ", " ".repeat(level), level)
}

fn dump_tree(out: &mut impl Write, tree: &RecordTree, level: usize) -> fmt::Result {
    let prefix = indent(level);
    for (key, value) in tree.fields() {
        write!(out, "{}{}", prefix, key)?;
        match value {
            FieldValue::Record(child) => {
                writeln!(out)?;
                dump_tree(out, child, level + 1)?;
            }
            FieldValue::List(items) => {
                writeln!(out)?;
                dump_list(out, key, items, level)?;
            }
            FieldValue::Scalar(scalar) => writeln!(out, " {}", describe(scalar))?,
        }
    }
    Ok(())
}

fn dump_list(out: &mut impl Write, key: &str, items: &[FieldValue], level: usize) -> fmt::Result {
    let prefix = indent(level);
    for (index, item) in items.iter().enumerate() {
        match item {
            FieldValue::Record(child) => {
                writeln!(out, "{}{}[{}]:", prefix, key, index)?;
                dump_tree(out, child, level + 1)?;
            }
            FieldValue::List(inner) => {
                writeln!(out, "{}  [{}] {{list}}: {}", prefix, index, inline_list(inner))?;
            }
            FieldValue::Scalar(scalar) => {
                writeln!(out, "{}  [{}] {}", prefix, index, describe(scalar))?;
            }
        }
    }
    Ok(())
}

fn describe(scalar: &Scalar) -> String {
    format!("{{{}}}: {}", scalar.kind(), scalar)
}

fn inline_list(items: &[FieldValue]) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|item| match item {
            FieldValue::Scalar(scalar) => scalar.to_string(),
            FieldValue::List(inner) => inline_list(inner),
            FieldValue::Record(child) => format!("<{}>", child.name()),
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_scalars() {
        let tree = RecordTree::new("rec").with("user", "alice").with("gone", None::<i64>);
        assert_eq!(tree.to_string(), " 1 user {string}: alice\n 1 gone {null}: null\n");
    }

    #[test]
    fn test_dump_nested_record() {
        let tree = RecordTree::new("rec").with("session", RecordTree::new("session").with("id", 42i64));
        assert_eq!(tree.to_string(), " 1 session\n  2 id {integer}: 42\n");
    }

    #[test]
    fn test_dump_list_mixed() {
        let tree = RecordTree::new("rec").with(
            "files",
            vec![
                FieldValue::from("a.txt"),
                FieldValue::from(RecordTree::new("file").with("name", "b.txt")),
            ],
        );

        let expected = " 1 files\n 1   [0] {string}: a.txt\n 1 files[1]:\n  2 name {string}: b.txt\n";
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn test_dump_empty_list() {
        let tree = RecordTree::new("rec").with("none", Vec::<FieldValue>::new());
        assert_eq!(tree.to_string(), " 1 none\n");
    }

    #[test]
    fn test_dump_nested_list_inline() {
        let inner = FieldValue::List(vec![FieldValue::from(1i64), FieldValue::from(2i64)]);
        let tree = RecordTree::new("rec").with("grid", vec![inner]);
        assert_eq!(tree.to_string(), " 1 grid\n 1   [0] {list}: [1, 2]\n");
    }
}
