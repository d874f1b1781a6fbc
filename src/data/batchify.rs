// ============================================================
// Layer 4 — Batchifier and Window Extractor
// ============================================================
// Starting from one flat token sequence, batchify arranges it
// into `streams` parallel columns. With the alphabet and four
// streams:
//
//   ┌ a g m s ┐
//   │ b h n t │
//   │ c i o u │
//   │ d j p v │
//   │ e k q w │
//   └ f l r x ┘
//
// Columns are independent: the dependence of 'g' on 'f' is
// never learned, in exchange for processing four streams per
// step. Tokens past the last full row ("y", "z") are dropped.
//
// A window then cuts rows out of this grid. With bptt = 2 and
// start = 0:
//
//   data   ┌ a g m s ┐   target  b h n t c i o u
//          └ b h n t ┘
//
// The target is the same rows shifted one step down, flattened
// time-major so it lines up with the flattened model output.

/// A `(steps, streams)` grid stored row-major, so row `t` is
/// time step `t` across every stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batched {
    cells:   Vec<u32>,
    steps:   usize,
    streams: usize,
}

/// Arrange `tokens` into `streams` equal columns, dropping the
/// `tokens.len() % streams` tail. `streams == 0` or more streams
/// than tokens yields an empty grid.
pub fn batchify(tokens: &[u32], streams: usize) -> Batched {
    if streams == 0 {
        return Batched { cells: Vec::new(), steps: 0, streams: 0 };
    }
    let steps = tokens.len() / streams;

    let mut cells = Vec::with_capacity(steps * streams);
    for t in 0..steps {
        for j in 0..streams {
            cells.push(tokens[j * steps + t]);
        }
    }

    Batched { cells, steps, streams }
}

impl Batched {
    /// Number of time steps (rows).
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of parallel streams (columns).
    pub fn streams(&self) -> usize {
        self.streams
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, step: usize, stream: usize) -> Option<u32> {
        if step >= self.steps || stream >= self.streams {
            return None;
        }
        self.cells.get(step * self.streams + stream).copied()
    }

    /// Flat row-major view of the grid.
    #[cfg(test)]
    pub fn as_slice(&self) -> &[u32] {
        &self.cells
    }

    /// Cut the window starting at row `start`, at most `bptt` rows
    /// long and always leaving one row for the target.
    pub fn window(&self, start: usize, bptt: usize) -> Window {
        let available = self.steps.saturating_sub(1).saturating_sub(start);
        let len       = bptt.min(available);

        let lo = start * self.streams;
        let hi = lo + len * self.streams;
        let (data, target) = if len == 0 {
            (Vec::new(), Vec::new())
        } else {
            (
                self.cells[lo..hi].to_vec(),
                self.cells[lo + self.streams..hi + self.streams].to_vec(),
            )
        };

        Window { data, target, len, streams: self.streams }
    }

    /// Row offsets `0, bptt, 2·bptt, …` of every non-empty window.
    pub fn window_starts(&self, bptt: usize) -> impl Iterator<Item = usize> {
        (0..self.steps.saturating_sub(1)).step_by(bptt.max(1))
    }

    /// Nominal batch count shown in progress lines.
    pub fn batch_count(&self, bptt: usize) -> usize {
        self.steps / bptt.max(1)
    }
}

// ─── Window ───────────────────────────────────────────────────────────────────
/// One training step's worth of rows plus the one-ahead target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// `len × streams` input tokens, time-major
    pub data:    Vec<u32>,
    /// `len × streams` next tokens, time-major
    pub target:  Vec<u32>,
    /// Rows in this window; shrinks below bptt at the tail
    pub len:     usize,
    pub streams: usize,
}

impl Window {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet() -> Vec<u32> {
        (0..26).collect()
    }

    #[test]
    fn test_shape_is_floor_n_over_b() {
        let b = batchify(&alphabet(), 4);
        assert_eq!(b.steps(), 6);
        assert_eq!(b.streams(), 4);
        assert_eq!(b.as_slice().len(), 24);
    }

    #[test]
    fn test_columns_are_contiguous_runs() {
        let b = batchify(&alphabet(), 4);
        // first row: a g m s
        assert_eq!(&b.as_slice()[0..4], &[0, 6, 12, 18]);
        for j in 0..4 {
            for t in 0..6 {
                assert_eq!(b.get(t, j), Some((j * 6 + t) as u32));
            }
        }
    }

    #[test]
    fn test_remainder_is_dropped() {
        let b = batchify(&alphabet(), 4);
        // y and z never appear
        assert!(!b.as_slice().contains(&24));
        assert!(!b.as_slice().contains(&25));
    }

    #[test]
    fn test_degenerate_stream_counts() {
        let tokens = alphabet();
        assert!(batchify(&tokens, 0).is_empty());
        assert!(batchify(&tokens, 27).is_empty());
        assert_eq!(batchify(&tokens, 27).steps(), 0);

        let single = batchify(&tokens, 26);
        assert_eq!(single.steps(), 1);
        assert!(single.window(0, 35).is_empty());
    }

    #[test]
    fn test_window_target_is_shifted_by_one_step() {
        let b = batchify(&alphabet(), 4);
        let w = b.window(0, 2);
        assert_eq!(w.len, 2);
        assert_eq!(w.data,   vec![0, 6, 12, 18, 1, 7, 13, 19]);
        assert_eq!(w.target, vec![1, 7, 13, 19, 2, 8, 14, 20]);

        let streams = b.streams();
        for k in 0..w.data.len() {
            assert_eq!(w.target[k], b.as_slice()[streams + k]);
        }
    }

    #[test]
    fn test_window_shrinks_at_tail() {
        let b = batchify(&alphabet(), 4);
        // 6 steps: start 4 leaves exactly one input row
        let w = b.window(4, 35);
        assert_eq!(w.len, 1);
        assert_eq!(w.data.len(), w.target.len());
        assert_eq!(w.target, vec![5, 11, 17, 23]);
    }

    #[test]
    fn test_window_is_empty_exactly_at_sequence_end() {
        let b = batchify(&alphabet(), 4);
        assert_eq!(b.window(4, 35).len, 1);
        assert!(b.window(5, 35).is_empty());
        assert!(b.window(9, 35).is_empty());
    }

    #[test]
    fn test_window_starts_never_yield_empty_windows() {
        let b = batchify(&alphabet(), 4);
        let starts: Vec<usize> = b.window_starts(2).collect();
        assert_eq!(starts, vec![0, 2, 4]);
        let lens: Vec<usize> = starts.iter().map(|&i| b.window(i, 2).len).collect();
        assert_eq!(lens, vec![2, 2, 1]);
        // every usable input row covered exactly once
        assert_eq!(lens.iter().sum::<usize>(), b.steps() - 1);
    }

    #[test]
    fn test_batch_count() {
        let b = batchify(&alphabet(), 2);
        assert_eq!(b.steps(), 13);
        assert_eq!(b.batch_count(5), 2);
    }
}
