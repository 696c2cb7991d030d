//! Fenwick tree over bag sizes, for uniform record selection.

/// Prefix sums over a growable list of counts. Indexes are 0-based.
#[derive(Clone, Debug, Default)]
pub(crate) struct Weights {
    // tree[i - 1] holds the sum of the range (i - lowbit(i), i].
    tree: Vec<usize>,
}

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

impl Weights {
    pub(crate) fn len(&self) -> usize {
        self.tree.len()
    }

    pub(crate) fn clear(&mut self) {
        self.tree.clear();
    }

    /// Sum of the first `n` counts.
    pub(crate) fn prefix_sum(&self, n: usize) -> usize {
        let mut i = n.min(self.tree.len());
        let mut sum = 0;
        while i > 0 {
            sum += self.tree[i - 1];
            i -= lowbit(i);
        }
        sum
    }

    pub(crate) fn get(&self, idx: usize) -> usize {
        self.prefix_sum(idx + 1) - self.prefix_sum(idx)
    }

    pub(crate) fn push(&mut self, count: usize) {
        let i = self.tree.len() + 1;
        let covered = self.prefix_sum(i - 1) - self.prefix_sum(i - lowbit(i));
        self.tree.push(count + covered);
    }

    pub(crate) fn pop(&mut self) {
        self.tree.pop();
    }

    pub(crate) fn increment(&mut self, idx: usize) {
        let mut i = idx + 1;
        while i <= self.tree.len() {
            self.tree[i - 1] += 1;
            i += lowbit(i);
        }
    }

    pub(crate) fn decrement(&mut self, idx: usize) {
        let mut i = idx + 1;
        while i <= self.tree.len() {
            self.tree[i - 1] -= 1;
            i += lowbit(i);
        }
    }

    pub(crate) fn set(&mut self, idx: usize, count: usize) {
        let current = self.get(idx);
        let mut i = idx + 1;
        while i <= self.tree.len() {
            self.tree[i - 1] = self.tree[i - 1] - current + count;
            i += lowbit(i);
        }
    }

    /// Maps a global position `k < total` to `(index, offset within index)`.
    pub(crate) fn locate(&self, mut k: usize) -> (usize, usize) {
        let len = self.len();
        let mut pos = 0;
        let mut step = if len == 0 { 0 } else { 1 << (usize::BITS - 1 - len.leading_zeros()) };
        while step > 0 {
            let next = pos + step;
            if next <= len && self.tree[next - 1] <= k {
                pos = next;
                k -= self.tree[next - 1];
            }
            step >>= 1;
        }
        (pos, k)
    }
}
