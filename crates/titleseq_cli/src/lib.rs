use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use titleseq::{
    create_title_sequence, list_title_sequences, load_title_sequence, resolve_sequence_paths,
    TitleSequence,
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Show { sequence: PathBuf, json: bool },
    List { dir: Option<PathBuf> },
    Create { sequence: PathBuf },
    AddPark {
        sequence: PathBuf,
        file: PathBuf,
        name: Option<String>,
    },
    RenamePark {
        sequence: PathBuf,
        index: usize,
        name: String,
    },
    RemovePark { sequence: PathBuf, index: usize },
    ExtractPark {
        sequence: PathBuf,
        index: usize,
        out: PathBuf,
    },
}

pub fn parse_args(args: &[String]) -> Result<CommandKind, String> {
    let command = args
        .first()
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let rest = &args[1..];

    match command {
        "show" => {
            let mut sequence = None;
            let mut json = false;
            for arg in rest {
                match arg.as_str() {
                    "--json" => json = true,
                    other if sequence.is_none() => sequence = Some(PathBuf::from(other)),
                    other => return Err(format!("unexpected argument '{other}' for show")),
                }
            }
            Ok(CommandKind::Show {
                sequence: sequence.ok_or_else(|| "show requires a sequence path".to_string())?,
                json,
            })
        }
        "list" => match rest {
            [] => Ok(CommandKind::List { dir: None }),
            [flag, dir] if flag == "--dir" => Ok(CommandKind::List {
                dir: Some(PathBuf::from(dir)),
            }),
            _ => Err("list takes only [--dir <path>]".to_string()),
        },
        "create" => match rest {
            [sequence] => Ok(CommandKind::Create {
                sequence: PathBuf::from(sequence),
            }),
            _ => Err("create requires exactly one sequence path".to_string()),
        },
        "add-park" => match rest {
            [sequence, file] => Ok(CommandKind::AddPark {
                sequence: PathBuf::from(sequence),
                file: PathBuf::from(file),
                name: None,
            }),
            [sequence, file, flag, name] if flag == "--name" => Ok(CommandKind::AddPark {
                sequence: PathBuf::from(sequence),
                file: PathBuf::from(file),
                name: Some(name.clone()),
            }),
            _ => Err("add-park requires <sequence> <file> [--name <entry>]".to_string()),
        },
        "rename-park" => match rest {
            [sequence, index, name] => Ok(CommandKind::RenamePark {
                sequence: PathBuf::from(sequence),
                index: parse_index(index)?,
                name: name.clone(),
            }),
            _ => Err("rename-park requires <sequence> <index> <name>".to_string()),
        },
        "remove-park" => match rest {
            [sequence, index] => Ok(CommandKind::RemovePark {
                sequence: PathBuf::from(sequence),
                index: parse_index(index)?,
            }),
            _ => Err("remove-park requires <sequence> <index>".to_string()),
        },
        "extract-park" => match rest {
            [sequence, index, out] => Ok(CommandKind::ExtractPark {
                sequence: PathBuf::from(sequence),
                index: parse_index(index)?,
                out: PathBuf::from(out),
            }),
            _ => Err("extract-park requires <sequence> <index> <out>".to_string()),
        },
        other => Err(format!("unknown subcommand '{other}'")),
    }
}

fn parse_index(raw: &str) -> Result<usize, String> {
    raw.parse::<usize>()
        .map_err(|_| format!("invalid index '{raw}' (expected usize)"))
}

pub fn run<W: Write>(kind: CommandKind, stdout: &mut W) -> Result<(), String> {
    match kind {
        CommandKind::Show { sequence, json } => {
            let sequence = load(&sequence)?;
            if json {
                let text = serde_json::to_string_pretty(&sequence)
                    .map_err(|error| format!("failed to encode sequence json: {error}"))?;
                writeln!(stdout, "{text}").map_err(write_error)
            } else {
                render_summary(&sequence, stdout).map_err(write_error)
            }
        }
        CommandKind::List { dir } => {
            let dir = match dir {
                Some(dir) => dir,
                None => {
                    resolve_sequence_paths()
                        .map_err(|error| error.to_string())?
                        .sequences_dir
                }
            };
            let entries = list_title_sequences(&dir).map_err(|error| error.to_string())?;
            for entry in entries {
                writeln!(
                    stdout,
                    "{}\t{:?}\t{}",
                    entry.name,
                    entry.kind,
                    entry.path.display()
                )
                .map_err(write_error)?;
            }
            Ok(())
        }
        CommandKind::Create { sequence } => {
            let created = create_title_sequence(&sequence).map_err(|error| error.to_string())?;
            writeln!(stdout, "created {} ({:?})", created.name(), created.kind())
                .map_err(write_error)
        }
        CommandKind::AddPark {
            sequence,
            file,
            name,
        } => {
            let mut sequence = load(&sequence)?;
            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .ok_or_else(|| format!("cannot derive entry name from {}", file.display()))?,
            };
            sequence
                .add_park(&file, &name)
                .map_err(|error| error.to_string())?;
            persist(&sequence)?;
            writeln!(stdout, "added {name}").map_err(write_error)
        }
        CommandKind::RenamePark {
            sequence,
            index,
            name,
        } => {
            let mut sequence = load(&sequence)?;
            check_index(&sequence, index)?;
            sequence
                .rename_park(index, &name)
                .map_err(|error| error.to_string())?;
            persist(&sequence)?;
            writeln!(stdout, "renamed #{index} to {name}").map_err(write_error)
        }
        CommandKind::RemovePark { sequence, index } => {
            let mut sequence = load(&sequence)?;
            check_index(&sequence, index)?;
            sequence
                .remove_park(index)
                .map_err(|error| error.to_string())?;
            persist(&sequence)?;
            writeln!(stdout, "removed #{index}").map_err(write_error)
        }
        CommandKind::ExtractPark {
            sequence,
            index,
            out,
        } => {
            let sequence = load(&sequence)?;
            check_index(&sequence, index)?;
            let mut handle = sequence
                .park_handle(index)
                .map_err(|error| error.to_string())?;
            let mut file = File::create(&out)
                .map_err(|error| format!("failed to create {}: {error}", out.display()))?;
            let bytes = io::copy(&mut handle.stream, &mut file)
                .map_err(|error| format!("failed to write {}: {error}", out.display()))?;
            info!(save = %handle.hint_path, out = %out.display(), bytes, "park_extracted");
            writeln!(stdout, "extracted {} ({bytes} bytes)", handle.hint_path).map_err(write_error)
        }
    }
}

fn load(path: &std::path::Path) -> Result<TitleSequence, String> {
    load_title_sequence(path).map_err(|error| error.to_string())
}

fn persist(sequence: &TitleSequence) -> Result<(), String> {
    sequence.save().map_err(|error| error.to_string())
}

fn check_index(sequence: &TitleSequence, index: usize) -> Result<(), String> {
    if index < sequence.saves().len() {
        Ok(())
    } else {
        Err(format!(
            "save index {index} out of range ({} saves)",
            sequence.saves().len()
        ))
    }
}

fn render_summary<W: Write>(sequence: &TitleSequence, stdout: &mut W) -> io::Result<()> {
    writeln!(
        stdout,
        "sequence={} kind={:?} path={}",
        sequence.name(),
        sequence.kind(),
        sequence.path().display()
    )?;
    for (index, save) in sequence.saves().iter().enumerate() {
        writeln!(stdout, "save[{index}]={save}")?;
    }
    write!(stdout, "{}", sequence.script_text())
}

fn write_error(error: io::Error) -> String {
    format!("failed to write output: {error}")
}

pub fn usage_text() -> String {
    [
        "titleseq - inspect and edit title sequences",
        "",
        "Usage:",
        "  titleseq show <sequence> [--json]",
        "  titleseq list [--dir <path>]",
        "  titleseq create <sequence>",
        "  titleseq add-park <sequence> <file> [--name <entry>]",
        "  titleseq rename-park <sequence> <index> <name>",
        "  titleseq remove-park <sequence> <index>",
        "  titleseq extract-park <sequence> <index> <out>",
        "",
        "A <sequence> ending in .parkseq is an archive; anything else is a directory.",
        "Without --dir, list uses $TITLESEQ_ROOT/sequences (or the nearest sequences/ above the current directory).",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_every_subcommand() {
        assert_eq!(
            parse_args(&args(&["show", "--json", "seq"])).expect("show"),
            CommandKind::Show {
                sequence: PathBuf::from("seq"),
                json: true,
            }
        );
        assert_eq!(
            parse_args(&args(&["list", "--dir", "d"])).expect("list"),
            CommandKind::List {
                dir: Some(PathBuf::from("d")),
            }
        );
        assert_eq!(
            parse_args(&args(&["add-park", "s", "f.sv6", "--name", "x.sv6"])).expect("add"),
            CommandKind::AddPark {
                sequence: PathBuf::from("s"),
                file: PathBuf::from("f.sv6"),
                name: Some("x.sv6".to_string()),
            }
        );
        assert_eq!(
            parse_args(&args(&["rename-park", "s", "2", "y.sv6"])).expect("rename"),
            CommandKind::RenamePark {
                sequence: PathBuf::from("s"),
                index: 2,
                name: "y.sv6".to_string(),
            }
        );
        assert_eq!(
            parse_args(&args(&["remove-park", "s", "0"])).expect("remove"),
            CommandKind::RemovePark {
                sequence: PathBuf::from("s"),
                index: 0,
            }
        );
    }

    #[test]
    fn rejects_bad_arguments_with_reason() {
        assert_eq!(
            parse_args(&args(&["remove-park", "s", "x"])).expect_err("bad index"),
            "invalid index 'x' (expected usize)"
        );
        assert_eq!(
            parse_args(&args(&["frobnicate"])).expect_err("unknown"),
            "unknown subcommand 'frobnicate'"
        );
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args(&["show"])).is_err());
    }

    #[test]
    fn create_add_remove_and_show_through_cli() {
        let temp = TempDir::new().expect("tempdir");
        let seq = temp.path().join("demo.parkseq");
        let park = temp.path().join("Park A.sv6");
        fs::write(&park, b"park").expect("park");
        let mut out = Vec::new();

        run(CommandKind::Create { sequence: seq.clone() }, &mut out).expect("create");
        run(
            CommandKind::AddPark {
                sequence: seq.clone(),
                file: park,
                name: None,
            },
            &mut out,
        )
        .expect("add");

        let error = run(
            CommandKind::RemovePark {
                sequence: seq.clone(),
                index: 5,
            },
            &mut out,
        )
        .expect_err("out of range");
        assert_eq!(error, "save index 5 out of range (1 saves)");

        out.clear();
        run(
            CommandKind::Show {
                sequence: seq,
                json: false,
            },
            &mut out,
        )
        .expect("show");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("save[0]=Park A.sv6"));
        assert!(text.contains("# SCRIPT FOR demo"));
    }

    #[test]
    fn show_json_includes_commands() {
        let temp = TempDir::new().expect("tempdir");
        let seq = temp.path().join("demo");
        fs::create_dir_all(&seq).expect("mkdir");
        fs::write(seq.join("script.txt"), "WAIT 100\nEND\n").expect("script");
        let mut out = Vec::new();

        run(
            CommandKind::Show {
                sequence: seq,
                json: true,
            },
            &mut out,
        )
        .expect("show");

        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["name"], "demo");
        assert_eq!(value["kind"], "directory");
        assert_eq!(value["commands"][0]["kind"], "wait");
        assert_eq!(value["commands"][0]["milliseconds"], 100);
        assert_eq!(value["commands"][1]["kind"], "end");
    }
}
