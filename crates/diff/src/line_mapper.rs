use crate::line_range::LineRange;

/// Piecewise-linear line correspondence between two sides
///
/// Breakpoints are the bounds of every change plus the `(0, 0)` and
/// `(line count, line count)` sentinels. Lines inside a change are spread
/// linearly over the other side's range; lines outside of changes keep a
/// constant offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMapper {
    points: Vec<(usize, usize)>,
}

impl LineMapper {
    /// Build a mapper from change ranges ordered on both sides
    ///
    /// A breakpoint that would move backwards on either side is dropped, so
    /// the mapping stays monotone even for damaged input.
    pub fn new(
        ranges: impl IntoIterator<Item = (LineRange, LineRange)>,
        from_lines: usize,
        to_lines: usize,
    ) -> Self {
        let mut points = vec![(0, 0)];
        let mut push = |point: (usize, usize)| {
            let &(last_from, last_to) = points.last().unwrap_or(&(0, 0));
            if point.0 >= last_from && point.1 >= last_to {
                points.push(point);
            }
        };

        for (from, to) in ranges {
            push((from.start, to.start));
            push((from.end, to.end));
        }
        push((from_lines, to_lines));

        Self { points }
    }

    /// The breakpoints, in order
    pub fn points(&self) -> &[(usize, usize)] {
        &self.points
    }

    /// Map a line of the first side onto the second
    pub fn map(&self, line: usize) -> usize {
        let next = self.points.partition_point(|&(from, _)| from <= line);
        let (from_start, to_start) = self.points[next.saturating_sub(1)];

        match self.points.get(next) {
            Some(&(from_end, to_end)) => {
                // from_end > line >= from_start
                let span = from_end - from_start;
                to_start + (line - from_start) * (to_end - to_start) / span
            }
            None => to_start + (line - from_start),
        }
    }
}
