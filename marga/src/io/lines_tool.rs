//! Region segments in the lines tool XML format.
//!
//! ```text
//! <lines2d>
//! <vertices>
//!     <0 x="1" y="2"/>      two vertices per segment
//!     ...
//! </vertices>
//! <groups>
//!     <0><begin>0</begin><end>8</end></0>   one group per region
//! </groups>
//! </lines2d>
//! ```
//!
//! Element names are the running indices the lines tool expects.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::region::RegionSet;

/// Write all region segments (lattice coordinates).
pub fn write_lines_tool<W: Write>(regions: &RegionSet, out: &mut W) -> std::io::Result<()> {
    let mut groups = Vec::with_capacity(regions.len());
    let mut vertex = 0usize;

    writeln!(out, "<lines2d>")?;
    writeln!(out, "<vertices>")?;
    for (idx, region) in regions.regions.iter().enumerate() {
        writeln!(out, "\t<!-- contour {idx} -->")?;
        let begin = vertex;
        for segment in region.segments() {
            for p in [segment.start, segment.end] {
                writeln!(out, "\t<{vertex} x=\"{}\" y=\"{}\"/>", p.x, p.y)?;
                vertex += 1;
            }
        }
        groups.push((begin, vertex));
    }
    writeln!(out, "</vertices>")?;

    writeln!(out, "<groups>")?;
    for (idx, (begin, end)) in groups.iter().enumerate() {
        writeln!(
            out,
            "\t<{idx}><begin>{begin}</begin><end>{end}</end></{idx}>"
        )?;
    }
    writeln!(out, "</groups>")?;
    writeln!(out, "</lines2d>")?;
    Ok(())
}

/// Save to a file.
pub fn save_lines_tool(regions: &RegionSet, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_lines_tool(regions, &mut out)?;
    out.flush()?;
    Ok(())
}
