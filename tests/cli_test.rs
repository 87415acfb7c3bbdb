use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use synth::cli::Args;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("synth")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_no_args() {
    let parsed = Args::try_parse_from(make_args(&[])).unwrap();

    assert_eq!(parsed.synth_file, None);
    assert_eq!(parsed.library_root, None);
    assert_eq!(parsed.generator_output, None);
    assert!(!parsed.skip_post_process);
    assert!(!parsed.verbose);
    assert_eq!(parsed.resolved_library_root(), PathBuf::from("."));
}

#[test]
fn test_all_flags() {
    let args = make_args(&[
        "--library-root",
        "./google-cloud-tasks",
        "--generator-output",
        "./generated",
        "--skip-post-process",
        "--verbose",
        "./synth.yml",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.synth_file, Some(PathBuf::from("./synth.yml")));
    assert_eq!(parsed.library_root, Some(PathBuf::from("./google-cloud-tasks")));
    assert_eq!(parsed.generator_output, Some(PathBuf::from("./generated")));
    assert!(parsed.skip_post_process);
    assert!(parsed.verbose);
    assert_eq!(parsed.resolved_library_root(), PathBuf::from("./google-cloud-tasks"));
}

#[test]
fn test_short_flags() {
    let args = make_args(&["-C", "lib-root", "-g", "out", "-v"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.library_root, Some(PathBuf::from("lib-root")));
    assert_eq!(parsed.generator_output, Some(PathBuf::from("out")));
    assert!(parsed.verbose);
}

#[test]
fn test_library_root_defaults_to_synth_file_dir() {
    let parsed =
        Args::try_parse_from(make_args(&["synth/google-cloud-tasks/synth.yml"])).unwrap();
    assert_eq!(parsed.resolved_library_root(), PathBuf::from("synth/google-cloud-tasks"));

    let parsed = Args::try_parse_from(make_args(&["synth.yml"])).unwrap();
    assert_eq!(parsed.resolved_library_root(), PathBuf::from("."));
}

#[test]
fn test_too_many_args() {
    let args = make_args(&["./synth.yml", "extra"]);
    assert!(Args::try_parse_from(args).is_err());
}
