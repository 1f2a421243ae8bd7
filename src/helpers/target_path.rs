use chrono::NaiveDateTime;

pub const ROOT_FOLDER: &str = "yggio";

/// Where a report is filed: `yggio/{yyyy}/{MM}/{dd}/{device}[/error]/{yyyy-MM-dd HH:mm:ss}.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    pub directory: String,
    pub file_name: String,
}

impl TargetPath {
    pub fn derive(device_name: &str, time: NaiveDateTime, error: bool) -> Self {
        TargetPath {
            directory: directory_path(device_name, time, error),
            file_name: file_name(time),
        }
    }
}

pub fn directory_path(device_name: &str, time: NaiveDateTime, error: bool) -> String {
    let folder = format!("{}/{}/{}", ROOT_FOLDER, time.format("%Y/%m/%d"), device_name);
    if error {
        format!("{}/error", folder)
    } else {
        folder
    }
}

// Sub-second digits are dropped, not rounded.
pub fn file_name(time: NaiveDateTime) -> String {
    format!("{}.json", time.format("%Y-%m-%d %H:%M:%S"))
}
