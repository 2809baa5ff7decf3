// newick.rs - Newick tree loader

use crate::data::tree::{Node, NodeId, PhyloTree};
use crate::error::{ChoosrError, Result};
use std::path::Path;

/// Bytes that end an unquoted label
const LABEL_DELIMITERS: &[u8] = b"(),:;[";

/// Single-pass reader over a Newick string.
///
/// Builds the node arena iteratively (no recursion) so deeply nested
/// caterpillar trees do not exhaust the stack.
struct NewickReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    nodes: Vec<Node>,
}

impl<'a> NewickReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
            nodes: Vec::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> ChoosrError {
        ChoosrError::NewickSyntax {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Skip whitespace and `[...]` comments
    fn skip_insignificant(&mut self) -> Result<()> {
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else if byte == b'[' {
                let start = self.pos;
                match self.bytes[self.pos..].iter().position(|&b| b == b']') {
                    Some(offset) => self.pos += offset + 1,
                    None => {
                        self.pos = start;
                        return Err(self.error("unclosed comment"));
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn new_node(&mut self, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(None, None, parent));
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn read_label(&mut self) -> Result<Option<String>> {
        self.skip_insignificant()?;
        if self.peek() == Some(b'\'') {
            self.pos += 1;
            let mut label = Vec::new();
            loop {
                match self.peek() {
                    None => return Err(self.error("unterminated quoted label")),
                    Some(b'\'') if self.bytes.get(self.pos + 1) == Some(&b'\'') => {
                        label.push(b'\'');
                        self.pos += 2;
                    }
                    Some(b'\'') => {
                        self.pos += 1;
                        break;
                    }
                    Some(byte) => {
                        label.push(byte);
                        self.pos += 1;
                    }
                }
            }
            return String::from_utf8(label)
                .map(Some)
                .map_err(|_| self.error("label is not valid UTF-8"));
        }

        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() || LABEL_DELIMITERS.contains(&byte) {
                break;
            }
            self.pos += 1;
        }
        let label = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| self.error("label is not valid UTF-8"))?;
        Ok(if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        })
    }

    fn read_branch_length(&mut self) -> Result<Option<f64>> {
        self.skip_insignificant()?;
        if self.peek() != Some(b':') {
            return Ok(None);
        }
        self.pos += 1;
        self.skip_insignificant()?;

        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_digit() || matches!(byte, b'.' | b'-' | b'+' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| self.error("branch length is not valid UTF-8"))?;
        if text.is_empty() {
            return Err(self.error("expected branch length after ':'"));
        }
        let length: f64 = text
            .parse()
            .map_err(|_| self.error(format!("invalid branch length '{}'", text)))?;
        if !(length >= 0.0 && length.is_finite()) {
            return Err(self.error(format!("branch length {} must be non-negative", text)));
        }
        Ok(Some(length))
    }

    fn read_label_and_length(&mut self, id: NodeId) -> Result<()> {
        self.nodes[id].name = self.read_label()?;
        self.nodes[id].branch_length = self.read_branch_length()?;
        Ok(())
    }

    fn parse(mut self) -> Result<PhyloTree> {
        let mut open: Vec<NodeId> = Vec::new();
        self.skip_insignificant()?;
        if self.peek().is_none() {
            return Err(self.error("empty input"));
        }

        'subtree: loop {
            self.skip_insignificant()?;
            if self.peek() == Some(b'(') {
                self.pos += 1;
                let id = self.new_node(open.last().copied());
                open.push(id);
                continue 'subtree;
            }
            let leaf = self.new_node(open.last().copied());
            self.read_label_and_length(leaf)?;

            loop {
                self.skip_insignificant()?;
                match self.peek() {
                    Some(b',') => {
                        if open.is_empty() {
                            return Err(self.error("',' outside of parentheses"));
                        }
                        self.pos += 1;
                        continue 'subtree;
                    }
                    Some(b')') => {
                        let id = open.pop().ok_or_else(|| self.error("unbalanced ')'"))?;
                        self.pos += 1;
                        self.read_label_and_length(id)?;
                    }
                    Some(b';') | None => {
                        if !open.is_empty() {
                            return Err(self.error(format!("{} unclosed '('", open.len())));
                        }
                        if self.peek() == Some(b';') {
                            self.pos += 1;
                        }
                        self.skip_insignificant()?;
                        if self.peek().is_some() {
                            return Err(self.error("unexpected content after end of tree"));
                        }
                        return PhyloTree::from_nodes(self.nodes, 0);
                    }
                    Some(byte) => {
                        return Err(self.error(format!("unexpected character '{}'", byte as char)));
                    }
                }
            }
        }
    }
}

impl PhyloTree {
    /// Parse a single Newick tree from a string.
    ///
    /// Branch lengths that are absent in the input stay unset; they are only
    /// reported when a distance query needs them.
    pub fn from_newick_str(input: &str) -> Result<Self> {
        NewickReader::new(input).parse()
    }

    /// Load a single Newick tree from a file.
    pub fn from_newick_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ChoosrError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_newick_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tree() {
        let tree = PhyloTree::from_newick_str("((A:1,B:2.5)inner:0.5,C:3e-1)root;").unwrap();
        assert_eq!(tree.leaf_names(), vec!["A", "B", "C"]);
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.node(tree.root()).name.as_deref(), Some("root"));

        let b = tree.find_leaf("B").unwrap();
        assert_eq!(tree.node(b).branch_length, Some(2.5));
        let c = tree.find_leaf("C").unwrap();
        assert_eq!(tree.node(c).branch_length, Some(0.3));
    }

    #[test]
    fn test_parse_multifurcation_and_missing_lengths() {
        let tree = PhyloTree::from_newick_str("(A,B,C,(D,E));").unwrap();
        assert_eq!(tree.leaf_count(), 5);
        assert_eq!(tree.node(tree.root()).children.len(), 4);
        let a = tree.find_leaf("A").unwrap();
        assert_eq!(tree.node(a).branch_length, None);
    }

    #[test]
    fn test_parse_quoted_labels_and_comments() {
        let input = "[tree comment] ('strain one':1,'it''s':2[&support=90], plain_name : 3 );";
        let tree = PhyloTree::from_newick_str(input).unwrap();
        assert_eq!(tree.leaf_names(), vec!["strain one", "it's", "plain_name"]);
        assert_eq!(tree.distance("strain one", "plain_name").unwrap(), 4.0);
    }

    #[test]
    fn test_parse_without_semicolon() {
        let tree = PhyloTree::from_newick_str("(A:1,B:1)\n").unwrap();
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_parse_single_leaf() {
        let tree = PhyloTree::from_newick_str("A;").unwrap();
        assert_eq!(tree.leaf_names(), vec!["A"]);
    }

    #[test]
    fn test_parse_errors() {
        for input in [
            "",
            "((A,B);",
            "(A,B));",
            "(A:-1,B:1);",
            "(A:,B:1);",
            "(A:1,B:1); extra",
            "(A,B)[open;",
            "('A,B);",
            "A,B;",
        ] {
            let result = PhyloTree::from_newick_str(input);
            assert!(
                matches!(result, Err(ChoosrError::NewickSyntax { .. })),
                "expected syntax error for {:?}, got {:?}",
                input,
                result
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let result = PhyloTree::from_newick_file(Path::new("/nonexistent/tree.nwk"));
        assert!(matches!(result, Err(ChoosrError::Io { .. })));
    }
}
