use std::io;

use crate::format::format_g6;
use crate::statistics::ShopReport;

/// Write the human-readable aggregate block, preceded by a blank line.
pub fn write_report<W: io::Write>(mut out: W, report: &ShopReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Aggregate statistics:")?;
    writeln!(
        out,
        "- Average queue length: {}",
        format_g6(report.average_queue_length)
    )?;
    writeln!(out, "- Maximum queue length: {}", report.max_queue_length)?;
    writeln!(
        out,
        "- Average time spent in the queue: {}",
        format_g6(report.average_wait)
    )?;
    writeln!(
        out,
        "- Queue length at the end of the simulation: {}",
        report.queue_length_at_end
    )?;
    writeln!(
        out,
        "- Average time spent in the queue by those customers still in the queue at the end of the simulation: {}",
        format_g6(report.average_remaining_wait)
    )?;
    writeln!(
        out,
        "- Number of customers for whom service was completed: {}",
        report.completed
    )?;
    writeln!(
        out,
        "- Average service time: {}",
        format_g6(report.average_service_time)
    )?;
    writeln!(
        out,
        "- Number of customers being served at the end of the simulation: {}",
        report.in_service_at_end
    )?;
    writeln!(
        out,
        "- Average service time for those customers being served at the end of the simulation: {}",
        format_g6(report.average_in_service_time)
    )?;
    for server in &report.servers {
        writeln!(
            out,
            "- Average server utilization for {}: {}",
            server.name,
            format_g6(server.utilization)
        )?;
    }
    writeln!(
        out,
        "- Average server utilization overall: {}",
        format_g6(report.overall_utilization)
    )?;
    Ok(())
}
