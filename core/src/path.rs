//! Structural paths.
//!
//! A [`Path`] names a position in the instance tree. Hook stores key per-component state by
//! path, so a path has to stay the same across renders for what is logically the same component,
//! and has to differ between any two components that are alive at the same time.
//!
//! Paths are a sequence of [`Segment`]s rather than a formatted string; the [`Display`]
//! impl produces the familiar dotted form (`root.c0.ikey.c1.tli.n1`).

use std::fmt::{self, Display};

use crate::element::{Element, ElementType, Key};

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// A keyed child. Stable under reordering.
    Key(Key),
    /// An unkeyed child at `index` with no earlier sibling of the same type.
    Index(usize),
    /// An unkeyed child at `index` preceded by `occurrence` siblings of the same type.
    Typed {
        /// Position among all siblings.
        index: usize,
        /// Tag of the child's type.
        tag: String,
        /// Number of earlier siblings sharing that type.
        occurrence: usize,
    },
}

impl Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, ".i{key}"),
            Self::Index(index) => write!(f, ".c{index}"),
            Self::Typed {
                index,
                tag,
                occurrence,
            } => write!(f, ".c{index}.t{tag}.n{occurrence}"),
        }
    }
}

/// Stable identifier of a tree position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    label: String,
    segments: Vec<Segment>,
}

impl Path {
    /// Creates a root path with the given label.
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            segments: Vec::new(),
        }
    }

    /// Returns the segments below the root.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the number of segments below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns a new path extended by `segment`.
    #[must_use]
    pub fn join(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self {
            label: self.label.clone(),
            segments,
        }
    }

    /// Derives the path of a child.
    ///
    /// Keyed children are addressed by key alone. Unkeyed children are addressed by index,
    /// refined by how many earlier `siblings` share the child's type. The refinement is a
    /// heuristic: it keeps anonymous siblings of one type apart, but it can still confuse
    /// instances when the type order of siblings changes between renders.
    ///
    /// Key collisions among siblings are not detected here.
    #[must_use]
    pub fn child(
        &self,
        key: Option<&Key>,
        index: usize,
        ty: &ElementType,
        siblings: Option<&[Option<Element>]>,
    ) -> Self {
        if let Some(key) = key {
            return self.join(Segment::Key(key.clone()));
        }

        let occurrence = siblings.map_or(0, |siblings| {
            siblings
                .iter()
                .take(index)
                .flatten()
                .filter(|sibling| sibling.ty() == ty)
                .count()
        });

        if occurrence > 0 {
            self.join(Segment::Typed {
                index,
                tag: ty.tag().into(),
                occurrence,
            })
        } else {
            self.join(Segment::Index(index))
        }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)?;
        for segment in &self.segments {
            Display::fmt(segment, f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{h, text};

    fn li() -> ElementType {
        ElementType::Host("li".into())
    }

    #[test]
    fn keyed_child_ignores_index() {
        let root = Path::root("root");
        let key = Key::from("a");
        let first = root.child(Some(&key), 0, &li(), None);
        let moved = root.child(Some(&key), 5, &li(), None);
        assert_eq!(first, moved);
        assert_eq!(first.to_string(), "root.ia");
    }

    #[test]
    fn unkeyed_child_without_same_type_siblings_uses_index() {
        let siblings = [Some(text("x")), Some(h("li").build())];
        let path = Path::root("root").child(None, 1, &li(), Some(&siblings));
        assert_eq!(path.to_string(), "root.c1");
    }

    #[test]
    fn unkeyed_child_counts_earlier_siblings_of_same_type() {
        let siblings = [
            Some(h("li").build()),
            None,
            Some(text("x")),
            Some(h("li").build()),
        ];
        let path = Path::root("root").child(None, 3, &li(), Some(&siblings));
        assert_eq!(path.to_string(), "root.c3.tli.n1");
        assert_eq!(path.depth(), 1);
    }

    #[test]
    fn siblings_at_different_positions_never_collide() {
        let siblings = [Some(h("li").build()), Some(h("li").build())];
        let root = Path::root("root");
        let a = root.child(None, 0, &li(), Some(&siblings));
        let b = root.child(None, 1, &li(), Some(&siblings));
        assert_ne!(a, b);
    }
}
