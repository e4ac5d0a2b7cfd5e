// src/core/matcher.rs

use crate::{constants::POSITIONAL_TERMINATOR, core::command::Command};

/// The deepest command path matched by the leading tokens of an argument vector.
#[derive(Debug, Clone)]
pub struct PathMatch<'t, 'a> {
    /// Root first, always at least the root.
    pub path: Vec<&'t Command>,
    /// Last element of `path`.
    pub leaf: &'t Command,
    /// Everything from the first token that did not select a subcommand.
    pub remainder: &'a [String],
}

/// Walks the tree one token at a time, descending into the child whose name or
/// alias equals the token.
///
/// Matching is greedy and never backtracks: a token that names a child is
/// always consumed as a subcommand, even when it was meant as a positional
/// argument. The walk stops at the first flag-looking token, at `--`, or at the
/// first token that names no child. It cannot fail.
pub fn match_path<'t, 'a>(root: &'t Command, argv: &'a [String]) -> PathMatch<'t, 'a> {
    let mut path = vec![root];
    let mut cursor = root;
    let mut consumed = 0;

    for token in argv {
        if token.starts_with('-') || token == POSITIONAL_TERMINATOR {
            break;
        }
        match cursor.find_child(token) {
            Some(child) => {
                log::trace!("Token '{}' selects subcommand '{}'", token, child.name());
                path.push(child);
                cursor = child;
                consumed += 1;
            }
            None => break,
        }
    }

    let remainder = argv.get(consumed..).unwrap_or_default();
    PathMatch {
        path,
        leaf: cursor,
        remainder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn tree() -> Command {
        let sub2 = Command::new("sub2").run(|_| Ok(()));
        let sub1 = Command::new("sub1").alias("s1").subcommand(sub2).unwrap();
        Command::new("app")
            .subcommand(sub1)
            .unwrap()
            .subcommand(Command::new("pos").run(|_| Ok(())))
            .unwrap()
    }

    fn names(m: &PathMatch<'_, '_>) -> Vec<String> {
        m.path.iter().map(|c| c.name().to_string()).collect()
    }

    #[test]
    fn test_descends_to_deepest_match() {
        let root = tree();
        let argv = args(&["sub1", "sub2", "--flag", "val", "pos1"]);
        let m = match_path(&root, &argv);

        assert_eq!(names(&m), vec!["app", "sub1", "sub2"]);
        assert_eq!(m.remainder, &args(&["--flag", "val", "pos1"])[..]);
        assert_eq!(m.leaf.name(), "sub2");
    }

    #[test]
    fn test_aliases_select_children() {
        let root = tree();
        let argv = args(&["s1", "sub2"]);
        let m = match_path(&root, &argv);
        assert_eq!(names(&m), vec!["app", "sub1", "sub2"]);
        assert!(m.remainder.is_empty());
    }

    #[test]
    fn test_stops_at_first_unknown_token() {
        let root = tree();
        let argv = args(&["sub1", "other", "sub2"]);
        let m = match_path(&root, &argv);
        assert_eq!(names(&m), vec!["app", "sub1"]);
        assert_eq!(m.remainder, &args(&["other", "sub2"])[..]);
    }

    #[test]
    fn test_stops_at_flags_and_terminator() {
        let root = tree();

        let argv = args(&["-v", "sub1"]);
        let m = match_path(&root, &argv);
        assert_eq!(names(&m), vec!["app"]);
        assert_eq!(m.remainder.len(), 2);

        let argv = args(&["--", "sub1"]);
        let m = match_path(&root, &argv);
        assert_eq!(names(&m), vec!["app"]);
        assert_eq!(m.remainder, &args(&["--", "sub1"])[..]);
    }

    #[test]
    fn test_subcommand_name_wins_over_positional_reading() {
        // "pos" names a child, so it is consumed even if the user meant an argument.
        let root = tree();
        let argv = args(&["pos", "pos"]);
        let m = match_path(&root, &argv);
        assert_eq!(names(&m), vec!["app", "pos"]);
        assert_eq!(m.remainder, &args(&["pos"])[..]);
    }

    #[test]
    fn test_empty_argv_matches_root_and_no_prefix_matching() {
        let root = tree();
        let m = match_path(&root, &[]);
        assert_eq!(names(&m), vec!["app"]);
        assert!(m.remainder.is_empty());

        let argv = args(&["sub"]);
        let m = match_path(&root, &argv);
        assert_eq!(names(&m), vec!["app"]);
        assert_eq!(m.remainder, &args(&["sub"])[..]);
    }
}
