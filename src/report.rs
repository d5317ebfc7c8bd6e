use crate::error::SwitchError;
use crate::types::{GroupStatus, RunResult};
use std::io;
use std::path::Path;

pub fn write_report_csv(run: &RunResult, path: &Path) -> Result<(), SwitchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_report(run, file)
}

pub fn write_report<W: io::Write>(run: &RunResult, writer: W) -> Result<(), SwitchError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["Block", "Filename", "URL", "Status", "Path", "Error"])?;

    for group in &run.groups {
        if let GroupStatus::Rejected { error } = &group.status {
            let dir = group.download_path.display().to_string();
            let error = error.to_string();
            wtr.write_record([
                group.name.as_str(),
                "",
                "",
                "Rejected",
                dir.as_str(),
                error.as_str(),
            ])?;
            continue;
        }

        for resolved in group.resolved() {
            let status = if resolved.fetched { "Fetched" } else { "AlreadyPresent" };
            let path = resolved.path.display().to_string();
            wtr.write_record([
                group.name.as_str(),
                resolved.descriptor.filename.as_str(),
                resolved.descriptor.url.as_str(),
                status,
                path.as_str(),
                "",
            ])?;
        }

        for failure in group.failures() {
            let path = group.download_path.join(&failure.descriptor.filename);
            let path = path.display().to_string();
            let error = failure.error.to_string();
            wtr.write_record([
                group.name.as_str(),
                failure.descriptor.filename.as_str(),
                failure.descriptor.url.as_str(),
                "Failed",
                path.as_str(),
                error.as_str(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
