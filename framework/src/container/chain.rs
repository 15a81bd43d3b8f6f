//! Per-thread resolution chain
//!
//! Every `Resolver` running on a thread joins the same chain, so a factory that
//! calls back into `Container::make` still sees the keys its caller is
//! constructing and counts towards the same depth limit.

use super::Container;

/// Nested resolutions deeper than this are treated as runaway recursion
pub(crate) const MAX_DEPTH: usize = 256;

/// Resolution state for one thread
#[derive(Debug, Default)]
pub(crate) struct ResolutionChain {
    depth: usize,
    /// Shared keys under construction, outermost first
    constructing: Vec<String>,
    /// Class keys being built, outermost first
    building: Vec<String>,
}

impl ResolutionChain {
    pub(crate) fn is_idle(&self) -> bool {
        self.depth == 0 && self.constructing.is_empty() && self.building.is_empty()
    }
}

#[derive(Clone, Copy)]
enum Frame {
    Depth,
    Constructing,
    Building,
}

/// Pops its frame off the thread's chain when dropped, including on unwind
pub(crate) struct ChainGuard<'c> {
    container: &'c Container,
    frame: Frame,
}

impl<'c> ChainGuard<'c> {
    /// Enter one level of resolution, or `None` past `MAX_DEPTH`
    pub(crate) fn depth(container: &'c Container) -> Option<Self> {
        container.with_chain(|chain| {
            if chain.depth >= MAX_DEPTH {
                return None;
            }
            chain.depth += 1;
            Some(Self {
                container,
                frame: Frame::Depth,
            })
        })
    }

    /// Mark a shared key as under construction
    ///
    /// Fails with the cycle (from the first occurrence of `key` back to
    /// `key`) when the key is already being constructed on this thread.
    pub(crate) fn constructing(container: &'c Container, key: &str) -> Result<Self, Vec<String>> {
        container.with_chain(|chain| {
            if let Some(pos) = chain.constructing.iter().position(|k| k == key) {
                let mut cycle = chain.constructing[pos..].to_vec();
                cycle.push(key.to_string());
                return Err(cycle);
            }
            chain.constructing.push(key.to_string());
            Ok(Self {
                container,
                frame: Frame::Constructing,
            })
        })
    }

    /// Mark a class as being built
    ///
    /// Fails with the full build chain followed by `key` when the class is
    /// already being built on this thread.
    pub(crate) fn building(container: &'c Container, key: &str) -> Result<Self, Vec<String>> {
        container.with_chain(|chain| {
            if chain.building.iter().any(|k| k == key) {
                let mut cycle = chain.building.clone();
                cycle.push(key.to_string());
                return Err(cycle);
            }
            chain.building.push(key.to_string());
            Ok(Self {
                container,
                frame: Frame::Building,
            })
        })
    }
}

impl Drop for ChainGuard<'_> {
    fn drop(&mut self) {
        let frame = self.frame;
        self.container.with_chain(|chain| match frame {
            Frame::Depth => chain.depth = chain.depth.saturating_sub(1),
            Frame::Constructing => {
                chain.constructing.pop();
            }
            Frame::Building => {
                chain.building.pop();
            }
        });
    }
}
