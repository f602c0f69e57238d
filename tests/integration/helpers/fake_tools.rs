//! Stand-ins for bowtie2, bwa and samtools.
//!
//! Each script appends its command line to `$FAKE_TOOL_LOG`, writes the files
//! the real tool would write, and prints a line to stderr the way the real
//! tools report progress.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const BOWTIE2_BUILD: &str = r#"#!/usr/bin/env bash
echo "bowtie2-build $*" >> "$FAKE_TOOL_LOG"
for last; do :; done
touch "$last.1.bt2" "$last.2.bt2"
echo "Settings: building a small index" >&2
"#;

const BOWTIE2: &str = r#"#!/usr/bin/env bash
echo "bowtie2 $*" >> "$FAKE_TOOL_LOG"
for arg in "$@"; do
  case "$arg" in *missing*) echo "Error: reads file $arg does not exist" >&2; exit 1;; esac
done
printf '@HD\tVN:1.6\n'
printf 'read1\t0\tchr1\t1\t42\t8M\t*\t0\t0\tACGTACGT\tIIIIIIII\n'
echo "1 reads; of these:" >&2
"#;

const BWA: &str = r#"#!/usr/bin/env bash
echo "bwa $*" >> "$FAKE_TOOL_LOG"
case "$1" in
  index) touch "$2.bwt" "$2.pac"; echo "[bwa_index] Pack FASTA... 0.00 sec" >&2 ;;
  mem)
    printf '@HD\tVN:1.6\n'
    printf 'read1\t0\tchr1\t1\t60\t8M\t*\t0\t0\tACGTACGT\tIIIIIIII\n'
    echo "[M::mem_process_seqs] Processed 1 reads" >&2 ;;
esac
"#;

const SAMTOOLS: &str = r#"#!/usr/bin/env bash
echo "samtools $*" >> "$FAKE_TOOL_LOG"
cmd=$1; shift
case "$cmd" in
  view|sort)
    out=""
    while [ $# -gt 0 ]; do
      case "$1" in -o) out=$2; shift 2 ;; *) shift ;; esac
    done
    if [ -n "$out" ]; then cat > "$out"; else cat; fi ;;
  index) touch "$1.bai" ;;
esac
"#;

/// A directory of fake tools plus the log they append to.
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub fn install() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for (name, script) in [
            ("bowtie2-build", BOWTIE2_BUILD),
            ("bowtie2", BOWTIE2),
            ("bwa", BWA),
            ("samtools", SAMTOOLS),
        ] {
            write_executable(&dir.path().join(name), script);
        }
        Self { dir }
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("invocations.log")
    }

    /// Recorded invocations, one per line.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn count(&self, program: &str) -> usize {
        let prefix = format!("{program} ");
        self.invocations().iter().filter(|line| line.starts_with(&prefix)).count()
    }

    /// Run the refmap binary with the fake tools first on `PATH`.
    pub fn run_refmap<S: AsRef<str>>(&self, args: &[S]) -> Output {
        let path = match std::env::var_os("PATH") {
            Some(existing) => {
                let mut dirs = vec![self.dir.path().to_path_buf()];
                dirs.extend(std::env::split_paths(&existing));
                std::env::join_paths(dirs).expect("Invalid PATH")
            }
            None => self.dir.path().as_os_str().to_owned(),
        };
        Command::new(env!("CARGO_BIN_EXE_refmap"))
            .args(args.iter().map(|a| a.as_ref()))
            .env("PATH", path)
            .env("FAKE_TOOL_LOG", self.log_path())
            .env("RUST_LOG", "info")
            .output()
            .expect("Failed to run refmap")
    }
}

fn write_executable(path: &Path, contents: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, contents).expect("Failed to write script");
    let mut perms = fs::metadata(path).expect("Failed to stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to chmod script");
}
