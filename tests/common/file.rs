use derive_new::new;
use fake::Fake;
use fake::faker::lorem::en::{Word, Words};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

pub fn write_file(file: FileSpec) {
    if let Some(parent) = file.path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    std::fs::write(&file.path, file.content).expect("Failed to write file");
}

/// Several lines of lorem text, newline terminated
pub fn random_content() -> String {
    let lines = (3..6).fake::<usize>();
    (0..lines)
        .map(|_| format!("{}\n", Words(3..8).fake::<Vec<String>>().join(" ")))
        .collect()
}

/// `files_count` files with distinct random names and content directly under `dir`
pub fn write_generated_files(dir: &Path, files_count: usize) -> Vec<FileSpec> {
    let mut files = Vec::new();

    while files.len() < files_count {
        let name = format!("{}-{}.txt", Word().fake::<String>(), files.len());
        let file = FileSpec::new(dir.join(name), random_content());
        write_file(file.clone());
        files.push(file);
    }

    files
}
