//! Iterative depth-first traversal of a part tree

use std::ops::ControlFlow;

use crate::models::MessagePart;

/// Visit every part in document order with its stable path
///
/// The path of a part is its server part id when one is declared, otherwise
/// `parent_path + "." + index` (top-level children of the root are `"0"`,
/// `"1"`, ...). The root itself has the empty path unless the server named it.
/// Returning `ControlFlow::Break` stops the walk.
pub fn walk_parts<'a, F>(root: &'a MessagePart, mut visit: F)
where
    F: FnMut(&'a MessagePart, &str) -> ControlFlow<()>,
{
    let root_path = declared_id(root).unwrap_or_default().to_string();
    let mut stack: Vec<(&'a MessagePart, String)> = vec![(root, root_path)];

    while let Some((part, path)) = stack.pop() {
        if visit(part, &path).is_break() {
            return;
        }

        // Reverse push keeps siblings in document order
        for (index, child) in part.children.iter().enumerate().rev() {
            let child_path = match declared_id(child) {
                Some(id) => id.to_string(),
                None if path.is_empty() => index.to_string(),
                None => format!("{}.{}", path, index),
            };
            stack.push((child, child_path));
        }
    }
}

fn declared_id(part: &MessagePart) -> Option<&str> {
    part.part_id.as_deref().filter(|id| !id.is_empty())
}
