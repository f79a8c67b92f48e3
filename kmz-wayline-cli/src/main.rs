use anyhow::{Context, Result};
use clap::Parser;
use kmz_wayline::{archive_path, convert, WaylineGenerator};
use rayon::ThreadPoolBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 入力KMLファイル、またはKMLを含むディレクトリ
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// 出力ディレクトリ（デフォルト: 入力ファイルと同じ場所）
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// 並列処理スレッド数（デフォルト: CPUコア数）
    #[arg(short, long)]
    threads: Option<usize>,

    /// KMZに圧縮せず wpmz/ ディレクトリとして出力
    #[arg(long)]
    unpacked: bool,
}

fn main() -> Result<()> {
    // ログの初期化（RUST_LOG 未指定時は info）
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .init();

    // CLI引数の解析
    let args = Args::parse();

    // 処理開始時間を記録
    let start_time = std::time::Instant::now();

    // スレッドプールの設定
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    // 出力ディレクトリの作成
    if let Some(output) = &args.output {
        fs::create_dir_all(output)
            .with_context(|| format!("Failed to create output directory {:?}", output))?;
    }

    let generator = WaylineGenerator::default();
    info!("Target drone model: {}", generator.config().model);

    // 入力パスの処理
    if args.input.is_file() {
        let ext = args
            .input
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if !ext.eq_ignore_ascii_case("kml") {
            error!("Unsupported file type: {:?}", args.input);
            anyhow::bail!("Input file must be .kml");
        }
        process_file(&args.input, args.output.as_deref(), args.unpacked, &generator)?;
    } else if args.input.is_dir() {
        info!("Processing directory: {:?}", args.input);
        process_directory(&args.input, &args, &generator)?;
    } else {
        error!("Invalid input path: {:?}", args.input);
        anyhow::bail!("Input path must be a file or directory");
    }

    // 処理時間を表示
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    Ok(())
}

fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

fn process_file(
    path: &Path,
    output_dir: Option<&Path>,
    unpacked: bool,
    generator: &WaylineGenerator,
) -> Result<()> {
    info!("Processing file: {:?}", path);

    // 入力全体をメモリに読み込んでから変換する
    let xml = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let package =
        convert(&xml, generator).with_context(|| format!("Failed to convert {:?}", path))?;

    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    }

    let archive = archive_path(path, output_dir);
    if unpacked {
        // 出力先: <stem>/wpmz/
        let root = archive.with_extension("");
        package.write_dir(&root)?;
    } else {
        package.write_archive(&archive)?;
    }

    Ok(())
}

fn process_directory(dir: &Path, args: &Args, generator: &WaylineGenerator) -> Result<()> {
    use rayon::prelude::*;

    // KMLファイルを再帰的に収集
    let input_files = collect_input_files(dir)?;
    info!("Found {} KML files", input_files.len());

    let output_dirs = plan_output_dirs(dir, &input_files, args.output.as_deref())?;

    // 並列処理でファイルを変換
    let results: Vec<Result<()>> = input_files
        .par_iter()
        .zip(&output_dirs)
        .map(|(path, out)| process_file(path, out.as_deref(), args.unpacked, generator))
        .collect();

    // エラーをチェック
    let mut errors = Vec::new();
    for (i, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            errors.push(format!("{}: {:#}", input_files[i].display(), e));
        }
    }

    if !errors.is_empty() {
        error!("Failed to process {} files:", errors.len());
        for err in &errors {
            error!("  {}", err);
        }
        anyhow::bail!("{} files failed to process", errors.len());
    }

    Ok(())
}

/// 各入力の出力ディレクトリを決める。
/// `-o` 指定時は入力ルートからの相対ディレクトリを出力先の下に再現する。
/// 出力先が重なる入力があれば変換前にエラーにする。
fn plan_output_dirs(
    input_root: &Path,
    files: &[PathBuf],
    output: Option<&Path>,
) -> Result<Vec<Option<PathBuf>>> {
    let mut targets: HashMap<PathBuf, &Path> = HashMap::new();
    let mut dirs = Vec::with_capacity(files.len());

    for path in files {
        let dir = output.map(|out| {
            match path.parent().and_then(|p| p.strip_prefix(input_root).ok()) {
                Some(relative) if !relative.as_os_str().is_empty() => out.join(relative),
                _ => out.to_path_buf(),
            }
        });

        let target = archive_path(path, dir.as_deref());
        if let Some(other) = targets.insert(target.clone(), path) {
            anyhow::bail!(
                "{:?} and {:?} would both be written to {:?}",
                other,
                path,
                target
            );
        }
        dirs.push(dir);
    }

    Ok(dirs)
}

fn collect_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            // サブディレクトリを再帰的に探索
            files.extend(collect_input_files(&path)?);
        } else if path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("kml"))
        {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
