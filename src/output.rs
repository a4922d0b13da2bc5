use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde_json::json;

use crate::metrics::{ProcessMetrics, Summary};
use crate::schedulers::Policy;
use crate::simulator::Outcome;
use crate::utils::prelude::*;

/// Heading for a policy, with the quantum where it applies
pub fn policy_heading(policy: Policy, quantum: u64) -> String {
    match policy {
        Policy::Rr => format!("{} Scheduling (Quantum={})", policy.title(), quantum),
        _ => format!("{} Scheduling", policy.title()),
    }
}

fn fmt_avg(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_owned(), |v| format!("{:.2}", v))
}

/// The text report of a single run: process table, averages and Gantt chart
pub fn render_report(
    mut w: impl Write,
    outcome: &Outcome,
    quantum: u64,
    rows: &[ProcessMetrics],
    summary: Option<&Summary>,
) -> Result<()> {
    writeln!(w, "{}", policy_heading(outcome.policy, quantum))?;
    writeln!(w)?;
    writeln!(
        w,
        "{:<8}{:>8}{:>8}{:>10}{:>8}{:>8}{:>9}{:>12}",
        "Process", "Arrival", "Burst", "Priority", "Start", "Finish", "Waiting", "Turnaround"
    )?;
    for r in rows {
        let priority = r.priority.map_or_else(|| "-".to_owned(), |p| p.to_string());
        writeln!(
            w,
            "{:<8}{:>8}{:>8}{:>10}{:>8}{:>8}{:>9}{:>12}",
            format!("P{}", r.id),
            r.arrival,
            r.burst,
            priority,
            r.start,
            r.finish,
            r.waiting,
            r.turnaround
        )?;
    }
    writeln!(w)?;
    match summary {
        Some(s) => {
            writeln!(w, "Average Waiting Time: {:.2}", s.avg_waiting)?;
            writeln!(w, "Average Turnaround Time: {:.2}", s.avg_turnaround)?;
            writeln!(w, "Average Response Time: {:.2}", s.avg_response)?;
            writeln!(w, "CPU Utilization: {:.2}%", s.cpu_utilization * 100.0)?;
        }
        None => {
            writeln!(w, "Average Waiting Time: undefined (no processes)")?;
            writeln!(w, "Average Turnaround Time: undefined (no processes)")?;
        }
    }
    writeln!(w)?;
    writeln!(w, "Gantt Chart (Text):")?;
    writeln!(w, "{}", outcome.timeline)?;
    Ok(())
}

/// One row per policy; `None` summaries print as `n/a`
pub fn render_comparison(mut w: impl Write, rows: &[(Policy, Option<Summary>)]) -> Result<()> {
    writeln!(
        w,
        "{:<10}{:>13}{:>16}{:>14}{:>10}{:>13}",
        "Policy", "Avg Waiting", "Avg Turnaround", "Avg Response", "Makespan", "Utilization"
    )?;
    for (policy, summary) in rows {
        let s = summary.as_ref();
        writeln!(
            w,
            "{:<10}{:>13}{:>16}{:>14}{:>10}{:>13}",
            policy.to_string(),
            fmt_avg(s.map(|s| s.avg_waiting)),
            fmt_avg(s.map(|s| s.avg_turnaround)),
            fmt_avg(s.map(|s| s.avg_response)),
            s.map_or_else(|| "n/a".to_owned(), |s| s.makespan.to_string()),
            s.map_or_else(|| "n/a".to_owned(), |s| format!("{:.2}%", s.cpu_utilization * 100.0)),
        )?;
    }
    Ok(())
}

/// Build a `chrome://tracing` document; each policy is a trace process and
/// each simulated process a thread in it.
pub fn chrome_trace(outcomes: &[Outcome]) -> serde_json::Value {
    let mut events = vec![];
    for (pid, outcome) in outcomes.iter().enumerate() {
        events.push(json!({
            "name": "process_name",
            "ph": "M",
            "pid": pid,
            "args": { "name": outcome.policy.title() },
        }));
        for p in &outcome.processes {
            events.push(json!({
                "name": "thread_name",
                "ph": "M",
                "pid": pid,
                "tid": p.id,
                "args": { "name": format!("P{}", p.id) },
            }));
            // arrival marker
            events.push(json!({
                "name": format!("P{} arrives", p.id),
                "ph": "i",
                "s": "t",
                "cat": "arrival",
                "ts": p.arrival.0,
                "pid": pid,
                "tid": p.id,
            }));
        }
        for iv in outcome.timeline.intervals() {
            events.push(json!({
                "name": format!("P{}", iv.pid),
                "ph": "X",
                "cat": "exec",
                "ts": iv.start.0,
                "dur": iv.duration().0,
                "pid": pid,
                "tid": iv.pid,
                "args": {
                    "start": iv.start.0,
                    "end": iv.end.0,
                }
            }));
        }
    }
    json!({
        "traceEvents": events,
        "displayTimeUnit": "ms",
    })
}

pub fn render_chrome_trace(path: &Path, outcomes: &[Outcome]) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut file, &chrome_trace(outcomes))?;
    file.flush()?;
    info!(path = %path.display(), "wrote chrome trace");
    Ok(())
}

/// Per-process metrics as CSV
pub fn write_job_trace(w: impl io::Write, rows: &[ProcessMetrics]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(w);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn render_job_trace(path: &Path, rows: &[ProcessMetrics]) -> Result<()> {
    write_job_trace(BufWriter::new(File::create(path)?), rows)?;
    info!(path = %path.display(), "wrote job trace");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{aggregate, per_process};
    use crate::simulator::{schedule, Stepping};
    use crate::types::{Process, ProcessSpec};

    fn outcome(policy: Policy) -> Outcome {
        let ps = Process::from_specs(vec![ProcessSpec::new(1, 0, 3), ProcessSpec::new(2, 3, 2)]).unwrap();
        schedule(&ps, policy, 4, Stepping::Event).unwrap()
    }

    #[test]
    fn report_lists_processes_averages_and_chart() {
        let out = outcome(Policy::Rr);
        let rows = per_process(&out).unwrap();
        let summary = aggregate(&out).unwrap();

        let mut buf = vec![];
        render_report(&mut buf, &out, 4, &rows, summary.as_ref()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("Round-Robin Scheduling (Quantum=4)\n"));
        assert!(text.contains("Average Waiting Time: 0.00"));
        assert!(text.contains("Average Turnaround Time: 2.50"));
        assert!(text.contains("| P1 (0-3) | P2 (3-5) |"));
    }

    #[test]
    fn empty_report_flags_undefined_averages() {
        let out = schedule(&[], Policy::Fcfs, 4, Stepping::Event).unwrap();
        let mut buf = vec![];
        render_report(&mut buf, &out, 4, &[], None).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Average Waiting Time: undefined"));
    }

    #[test]
    fn comparison_has_a_row_per_policy() {
        let rows = vec![
            (Policy::Fcfs, aggregate(&outcome(Policy::Fcfs)).unwrap()),
            (Policy::Priority, None),
        ];
        let mut buf = vec![];
        render_comparison(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("fcfs"));
        assert!(lines[1].contains("2.50"));
        assert!(lines[2].starts_with("priority"));
        assert!(lines[2].contains("n/a"));
    }

    #[test]
    fn chrome_trace_has_one_exec_event_per_interval() {
        let trace = chrome_trace(&[outcome(Policy::Fcfs), outcome(Policy::Srpt)]);
        let events = trace["traceEvents"].as_array().unwrap();
        let exec: Vec<_> = events.iter().filter(|e| e["ph"] == "X").collect();
        assert_eq!(exec.len(), 4);
        assert_eq!(exec[1]["ts"], 3);
        assert_eq!(exec[1]["dur"], 2);
        assert_eq!(exec[3]["pid"], 1);
    }

    #[test]
    fn job_trace_csv() {
        let rows = per_process(&outcome(Policy::Sjf)).unwrap();
        let mut buf = vec![];
        write_job_trace(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,arrival,burst,priority,start,finish,waiting,turnaround,response")
        );
        assert_eq!(lines.next(), Some("1,0,3,,0,3,0,3,0"));
    }
}
