use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::generator::{Mode, WaylineGenerator};
use crate::parser::normalize;

/// アーカイブ内で文書を格納するディレクトリ
pub const DOCUMENT_DIR: &str = "wpmz";
pub const ARCHIVE_EXTENSION: &str = "kmz";

/// 生成済みのテンプレートと航線ファイルの組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaylinePackage {
    pub template: String,
    pub waylines: String,
}

impl WaylinePackage {
    pub fn document(&self, mode: Mode) -> &str {
        match mode {
            Mode::Template => &self.template,
            Mode::Execution => &self.waylines,
        }
    }

    fn entries(&self) -> [(String, &str); 2] {
        [Mode::Template, Mode::Execution]
            .map(|mode| (format!("{DOCUMENT_DIR}/{}", mode.file_name()), self.document(mode)))
    }

    /// `root/wpmz/` 以下に2つの文書を書き出す
    pub fn write_dir(&self, root: &Path) -> Result<PathBuf> {
        let dir = root.join(DOCUMENT_DIR);
        fs::create_dir_all(&dir).map_err(|e| Error::write(&dir, e))?;

        for mode in [Mode::Template, Mode::Execution] {
            let path = dir.join(mode.file_name());
            fs::write(&path, self.document(mode)).map_err(|e| Error::write(&path, e))?;
            debug!("Written {:?}", path);
        }

        info!("Written wayline documents: {:?}", dir);
        Ok(dir)
    }

    /// KMZ（zip）として書き出す。一時ファイルに書いてから置き換える。
    pub fn write_archive(&self, path: &Path) -> Result<()> {
        let mut partial = path.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let result = self
            .write_zip(&partial)
            .and_then(|()| fs::rename(&partial, path).map_err(|e| Error::write(path, e)));
        if let Err(e) = result {
            // 書きかけのファイルは残さない
            let _ = fs::remove_file(&partial);
            return Err(e);
        }

        info!("Written KMZ: {:?}", path);
        Ok(())
    }

    fn write_zip(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::write(path, e))?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.add_directory(format!("{DOCUMENT_DIR}/"), options)?;
        for (name, content) in self.entries() {
            zip.start_file(name, options)?;
            zip.write_all(content.as_bytes())
                .map_err(|e| Error::write(path, e))?;
        }

        let file = zip.finish()?;
        file.sync_all().map_err(|e| Error::write(path, e))?;
        Ok(())
    }
}

/// 入力ファイルと同じ名前の `.kmz` の出力先を求める
pub fn archive_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mission");
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new(""));
    dir.join(format!("{stem}.{ARCHIVE_EXTENSION}"))
}

/// 正規化を1回行い、テンプレート→航線ファイルの順に生成する。
/// どちらかが失敗した時点で中断する。
pub fn convert(xml: &[u8], generator: &WaylineGenerator) -> Result<WaylinePackage> {
    let root = normalize(xml)?;
    let template = generator.generate(&root, Mode::Template)?;
    let waylines = generator.generate(&root, Mode::Execution)?;
    Ok(WaylinePackage { template, waylines })
}
