pub mod azure_storage;
pub mod config;
pub mod device_report;
pub mod ingest;
pub mod report_time;
pub mod sas_url;
pub mod target_path;

#[cfg(test)]
pub mod test_log;
