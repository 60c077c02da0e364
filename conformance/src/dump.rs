//! Human-readable lattice reports.
//!
//! Writers are fed records as the pipeline produces them and never hold a
//! walk in memory. A walk is printed one block per outermost coordinate,
//! one sub-heading per second coordinate, and one line per run of the
//! innermost axis:
//!
//! ```text
//! ========================== TZYX order ===========================
//! T = 0
//!   Z = 0
//!     [0,0,0,0 =   0] [1,0,0,0 =   1] [2,0,0,0 =   2]
//!     [0,1,0,0 =   3] [1,1,0,0 =   4] [2,1,0,0 =   5]
//! ```
//!
//! The distributed report repeats that layout for each rank, laid out over
//! the rank's local coordinates but printing global coordinates and
//! offsets.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gluonic_lattice::enumerate::MajorOrder;
use gluonic_lattice::{coordinate_of, neighbours, rank_to_coord, Coord, Decomposition, MemoryRecord};

const AXIS_LABELS: [&str; 4] = ["X", "Y", "Z", "T"];
const RULE_WIDTH: usize = 64;

/// Opens a report sink: `-` is standard output, anything else a file that
/// is created or truncated.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn open_sink(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn order_rule(order: MajorOrder) -> String {
    format!("{:=^width$}", format!(" {} order ", order.label()), width = RULE_WIDTH)
}

fn digits(mut n: usize) -> usize {
    let mut width = 1;
    while n >= 10 {
        n /= 10;
        width += 1;
    }
    width
}

/// Nested layout state shared by both writers.
#[derive(Debug)]
struct Layout {
    nesting: [usize; 4],
    width: usize,
    previous: Option<Coord>,
}

impl Layout {
    fn new(order: MajorOrder, volume: usize) -> Self {
        Self {
            nesting: order.nesting(),
            width: digits(volume.saturating_sub(1)),
            previous: None,
        }
    }

    /// Writes one entry: `site` drives the nesting, `shown` is printed.
    fn entry(
        &mut self,
        out: &mut impl Write,
        site: &Coord,
        shown: &Coord,
        offset: usize,
    ) -> io::Result<()> {
        let [outer, middle, inner, _] = self.nesting;
        // First nesting level whose coordinate changed; 3 means same row.
        let level = match self.previous {
            None => 0,
            Some(prev) => [outer, middle, inner]
                .iter()
                .position(|&axis| prev[axis] != site[axis])
                .unwrap_or(3),
        };
        if level < 3 && self.previous.is_some() {
            writeln!(out)?;
        }
        if level == 0 {
            writeln!(out, "{} = {}", AXIS_LABELS[outer], site[outer])?;
        }
        if level <= 1 {
            writeln!(out, "  {} = {}", AXIS_LABELS[middle], site[middle])?;
        }
        if level <= 2 {
            write!(out, "    ")?;
        } else {
            write!(out, " ")?;
        }
        write!(
            out,
            "[{},{},{},{} = {:>w$}]",
            shown[0],
            shown[1],
            shown[2],
            shown[3],
            offset,
            w = self.width
        )?;
        self.previous = Some(*site);
        Ok(())
    }

    fn close(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.previous.take().is_some() {
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Writer for the monolithic report.
#[derive(Debug)]
pub struct MonolithicWriter<W: Write> {
    out: W,
    layout: Layout,
}

impl<W: Write> MonolithicWriter<W> {
    /// Starts a report for a lattice of `volume` sites walked in `order`.
    ///
    /// # Errors
    ///
    /// Returns any error from writing the heading.
    pub fn new(mut out: W, order: MajorOrder, volume: usize) -> io::Result<Self> {
        writeln!(out, "{}", order_rule(order))?;
        Ok(Self {
            out,
            layout: Layout::new(order, volume),
        })
    }

    /// Appends one monolithic record.
    ///
    /// # Errors
    ///
    /// Returns any error from the sink.
    pub fn write(&mut self, record: &MemoryRecord) -> io::Result<()> {
        self.layout
            .entry(&mut self.out, &record.coord, &record.coord, record.offset)
    }

    /// Ends the report, flushes, and hands back the sink.
    ///
    /// # Errors
    ///
    /// Returns any error from the final write or flush.
    pub fn finish(mut self) -> io::Result<W> {
        self.layout.close(&mut self.out)?;
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Writer for the per-rank distributed report.
#[derive(Debug)]
pub struct DistributedWriter<'a, W: Write> {
    out: W,
    decomposition: &'a Decomposition,
    layout: Layout,
    rank: Option<usize>,
}

impl<'a, W: Write> DistributedWriter<'a, W> {
    /// Starts a report over `decomposition`.
    pub fn new(out: W, decomposition: &'a Decomposition) -> Self {
        Self {
            out,
            decomposition,
            layout: Layout::new(MajorOrder::Tzyx, decomposition.dimensions().volume()),
            rank: None,
        }
    }

    /// Appends one distributed record, opening a new rank section when the
    /// owning rank changes.
    ///
    /// # Errors
    ///
    /// Returns an error from the sink, or `InvalidInput` for a record
    /// without a placement.
    pub fn write(&mut self, record: &MemoryRecord) -> io::Result<()> {
        let placement = record.placement.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "record has no placement")
        })?;
        if self.rank != Some(placement.rank) {
            self.layout.close(&mut self.out)?;
            if self.rank.is_some() {
                writeln!(self.out)?;
            }
            writeln!(self.out, "Processor: {:>2}", placement.rank)?;
            writeln!(self.out, "{}", order_rule(MajorOrder::Tzyx))?;
            self.rank = Some(placement.rank);
        }
        let local = coordinate_of(placement.local_offset, &self.decomposition.sub_lattice())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.layout
            .entry(&mut self.out, &local, &record.coord, record.offset)
    }

    /// Ends the report, flushes, and hands back the sink.
    ///
    /// # Errors
    ///
    /// Returns any error from the final write or flush.
    pub fn finish(mut self) -> io::Result<W> {
        self.layout.close(&mut self.out)?;
        self.out.flush()?;
        Ok(self.out)
    }
}

fn list(values: &[usize]) -> String {
    let items: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// Writes the derived quantities of a decomposition.
///
/// With `per_rank`, appends each rank's process coordinate and its eight
/// neighbours as `-x +x -y +y -z +z -t +t`.
///
/// # Errors
///
/// Returns any error from the sink, or a lattice error from the rank
/// decode.
pub fn write_summary(
    out: &mut impl Write,
    decomposition: &Decomposition,
    per_rank: bool,
) -> Result<()> {
    let d = decomposition;
    writeln!(out, "Lattice dimensions (N):           {}", list(&d.extent().0))?;
    writeln!(out, "Lattice volumes (V):              {}", list(&d.volumes()))?;
    writeln!(out, "Sub-lattice dimensions (NSub):    {}", list(&d.sub_lattice().0))?;
    writeln!(out, "Sub-lattice volumes (VSub):       {}", list(&d.sub_volumes()))?;
    writeln!(out, "Number of processes (P):          {}", d.processes())?;
    writeln!(out, "Processes per dimension:          {}", list(&d.process_grid().0))?;
    writeln!(out, "Process grid volumes (VProc):     {}", list(&d.process_volumes()))?;

    if per_rank {
        let width = digits(d.processes().saturating_sub(1));
        writeln!(out)?;
        writeln!(out, "rank  coordinate  neighbours")?;
        for rank in d.ranks() {
            let coord = rank_to_coord(rank, &d.process_grid(), &d.process_volumes())?;
            let around = neighbours(rank, d)?;
            let ranks: Vec<String> = around
                .list
                .iter()
                .map(|r| format!("{r:>width$}"))
                .collect();
            writeln!(out, "{rank:>4}  {:<10}  {}", coord.to_string(), ranks.join(" "))?;
        }
    }
    out.flush()?;
    Ok(())
}
