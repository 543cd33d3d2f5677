/// Address-range dispatch table built from change-points.
///
/// Each entry marks the first address of a run served by one handler; the
/// run extends up to the next change-point. Lookups binary-search the
/// sorted starts, so a table of a handful of entries covers a 64K space
/// without per-byte storage.
#[derive(Clone, Debug)]
pub struct BlockMap<H> {
    entries: Vec<(u16, H)>,
}

impl<H: Copy> BlockMap<H> {
    /// Build from `(start, handler)` pairs in any order. A later duplicate
    /// start replaces an earlier one.
    pub fn from_change_points(points: impl IntoIterator<Item = (u16, H)>) -> Self {
        let mut entries: Vec<(u16, H)> = Vec::new();
        for (start, handler) in points {
            match entries.binary_search_by_key(&start, |&(s, _)| s) {
                Ok(i) => entries[i].1 = handler,
                Err(i) => entries.insert(i, (start, handler)),
            }
        }
        Self { entries }
    }

    /// Handler for `addr`, or `None` below the first change-point.
    #[inline]
    pub fn resolve(&self, addr: u16) -> Option<H> {
        let i = self.entries.partition_point(|&(start, _)| start <= addr);
        i.checked_sub(1).map(|i| self.entries[i].1)
    }

    /// Start address of the run containing `addr`.
    #[inline]
    pub fn block_start(&self, addr: u16) -> Option<u16> {
        let i = self.entries.partition_point(|&(start, _)| start <= addr);
        i.checked_sub(1).map(|i| self.entries[i].0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
