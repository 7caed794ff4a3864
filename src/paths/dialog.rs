use crate::paths::base::PathProvider;
use log::debug;
use rfd::FileDialog;
use std::path::PathBuf;

/// 通过系统原生对话框选择路径
#[derive(Debug, Default)]
pub struct DialogPathProvider;

impl DialogPathProvider {
    pub fn new() -> Self {
        Self
    }
}

impl PathProvider for DialogPathProvider {
    fn provider_name(&self) -> &'static str {
        "dialog"
    }

    fn source_file(&self) -> Option<PathBuf> {
        debug!("Opening file dialog");
        FileDialog::new()
            .set_title("CSV-Datei auswählen")
            .add_filter("CSV-Dateien", &["csv"])
            .add_filter("Alle Dateien", &["*"])
            .pick_file()
    }

    fn output_dir(&self) -> Option<PathBuf> {
        debug!("Opening folder dialog");
        FileDialog::new()
            .set_title("Ordner zum Speichern der Charts auswählen")
            .pick_folder()
    }
}
