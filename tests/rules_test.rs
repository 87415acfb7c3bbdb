use std::fs;
use std::path::{Path, PathBuf};

use synth::config::load_config;
use synth::error::{Error, ValidationIssue};
use synth::renderer::MiniJinjaRenderer;
use synth::rules::{CompiledRule, Precondition, SubstitutionRule, Transform};
use tempfile::TempDir;

fn tasks_rules(id: &str) -> Vec<CompiledRule> {
    let synth_path =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("synth/google-cloud-tasks/synth.yml");
    let config = load_config(synth_path).unwrap();
    let rule = config
        .mappings
        .iter()
        .flat_map(|m| m.rules.iter())
        .find(|r| r.id.as_deref() == Some(id))
        .unwrap_or_else(|| panic!("no rule '{id}'"));
    rule.expand(&MiniJinjaRenderer::new())
        .unwrap()
        .into_iter()
        .map(|r| r.compile().unwrap())
        .collect()
}

fn tasks_rule(id: &str) -> CompiledRule {
    let mut rules = tasks_rules(id);
    assert_eq!(rules.len(), 1);
    rules.remove(0)
}

/// Rewrites `content` and checks a second pass changes nothing.
fn rewrite_once(rule: &CompiledRule, content: &str) -> String {
    let first = rule.rewrite(content).unwrap();
    let second = rule.rewrite(&first.content).unwrap();
    assert_eq!(second.content, first.content, "rule '{}' is not idempotent", rule.label());
    first.content
}

const GEMSPEC: &str = r#"Gem::Specification.new do |gem|
  gem.name          = "google-cloud-tasks"
  gem.version       = "0.2.4"

  gem.add_dependency "google-gax", "~> 1.3"

  gem.add_development_dependency "minitest", "~> 5.10"
  gem.add_development_dependency "rubocop", "~> 0.50.0"
end
"#;

#[test]
fn test_gax_iam_dependency() {
    let rule = tasks_rule("gax-iam-dependency");
    let rewrite = rule.rewrite(GEMSPEC).unwrap();

    assert_eq!(rewrite.replacements, 1);
    assert!(rewrite.content.contains(
        "\n  gem.add_dependency \"google-gax\", \"~> 1.3\"\n  \
         gem.add_dependency \"grpc-google-iam-v1\", \"~> 0.6.9\"\n\n  \
         gem.add_development_dependency \"minitest\""
    ));
    assert_eq!(rule.rewrite(&rewrite.content).unwrap().replacements, 0);
}

#[test]
fn test_rubocop_pin() {
    let rule = tasks_rule("rubocop-pin");
    let content = rewrite_once(&rule, GEMSPEC);

    assert!(content.contains("  gem.add_development_dependency \"rubocop\", \"~> 0.64.0\"\nend\n"));
    assert!(!content.contains("0.50.0"));
}

#[test]
fn test_private_stub_reader() {
    let rule = tasks_rule("private-stub-reader");
    for indent in ["", "  ", "          "] {
        let content = format!(
            "module Google\n{indent}class CloudTasksClient\n{indent}  attr_reader :cloud_tasks_stub\n\n{indent}  def initialize\n"
        );
        let expected = format!(
            "module Google\n{indent}class CloudTasksClient\n{indent}  # @private\n{indent}  attr_reader :cloud_tasks_stub\n\n{indent}  def initialize\n"
        );
        assert_eq!(rewrite_once(&rule, &content), expected);
    }
}

#[test]
fn test_private_stub_reader_needs_client_class() {
    let rule = tasks_rule("private-stub-reader");
    let content = "module Google\n  class Credentials\n    attr_reader :cloud_tasks_stub\n";
    assert_eq!(rule.rewrite(content).unwrap().replacements, 0);
}

#[test]
fn test_header_spacing() {
    let rule = tasks_rule("header-spacing");

    let content = "# Copyright 2019 Google LLC\n#\n# Licensed under the Apache License\nrequire \"json\"\n";
    assert_eq!(
        rewrite_once(&rule, content),
        "# Copyright 2019 Google LLC\n#\n# Licensed under the Apache License\n\nrequire \"json\"\n"
    );

    let content = "# Generated by the protocol buffer compiler.  DO NOT EDIT!\n# source: google/cloud/tasks/v2beta3/queue.proto\nrequire 'google/protobuf'\n";
    assert_eq!(
        rewrite_once(&rule, content),
        "# Generated by the protocol buffer compiler.  DO NOT EDIT!\n# source: google/cloud/tasks/v2beta3/queue.proto\n\nrequire 'google/protobuf'\n"
    );

    let content = "# frozen_string_literal: true\n\n# Copyright 2019 Google LLC\nmodule Google\n";
    assert_eq!(
        rewrite_once(&rule, content),
        "# frozen_string_literal: true\n\n# Copyright 2019 Google LLC\n\nmodule Google\n"
    );
}

#[test]
fn test_header_spacing_leaves_spaced_headers_alone() {
    let rule = tasks_rule("header-spacing");
    for content in [
        "# Copyright 2019 Google LLC\n\nrequire \"json\"\n",
        "# A plain comment\nrequire \"json\"\n",
        "require \"json\"\n# Copyright 2019 Google LLC\nmodule Google\n",
    ] {
        assert_eq!(rule.rewrite(content).unwrap().replacements, 0, "{content}");
    }
}

#[test]
fn test_url_rewrites() {
    let org = tasks_rule("github-org-url");
    let pages = tasks_rule("github-pages-url");
    let content = "\
# See https://github.com/GoogleCloudPlatform/google-cloud-ruby/issues
# Docs https://googlecloudplatform.github.io/google-cloud-ruby/#/docs
# Other https://github.com/GoogleCloudPlatform/other-repo
# Twice https://github.com/GoogleCloudPlatform/google-cloud-ruby https://github.com/GoogleCloudPlatform/google-cloud-ruby
";
    let content = rewrite_once(&pages, &rewrite_once(&org, content));

    assert!(!content.contains("https://github.com/GoogleCloudPlatform/google-cloud-ruby"));
    assert!(!content.contains("https://googlecloudplatform.github.io/google-cloud-ruby"));
    assert_eq!(content.matches("https://github.com/googleapis/google-cloud-ruby").count(), 3);
    assert!(content.contains("https://googleapis.github.io/google-cloud-ruby/#/docs"));
    assert!(content.contains("https://github.com/GoogleCloudPlatform/other-repo"));
}

#[test]
fn test_escape_comment_braces() {
    let rule = tasks_rule("escape-comment-braces");
    let content = r##"
        # Creates a queue.
        #
        # @param parent [String]
        #   Format: `projects/{project_id}/locations/{location_id}`
        #   The queue name, e.g. projects/{project_id}/queues/{queue_id}
        def create_queue(parent)
          "#{parent}/queues/{queue_id}"
        end
"##;
    let expected = r##"
        # Creates a queue.
        #
        # @param parent [String]
        #   Format: `projects/{project_id}/locations/{location_id}`
        #   The queue name, e.g. projects/\\{project_id}/queues/\\{queue_id}
        def create_queue(parent)
          "#{parent}/queues/{queue_id}"
        end
"##;
    assert_eq!(rewrite_once(&rule, content), expected);
}

#[test]
fn test_require_helpers_per_version() {
    let rules = tasks_rules("require-helpers");
    let labels: Vec<&str> = rules.iter().map(|r| r.label()).collect();
    assert_eq!(
        labels,
        vec!["require-helpers[version=v2beta2]", "require-helpers[version=v2beta3]"]
    );

    let content = "require \"google/cloud/tasks/v2beta2/cloud_tasks_client\"\n";
    let rewrite = rules[0].rewrite(content).unwrap();
    assert_eq!(
        rewrite.content,
        "require \"google/cloud/tasks/v2beta2/cloud_tasks_client\"\n\
         require \"google/cloud/tasks/v2beta2/helpers\"\n"
    );
    assert!(!rules[0].admits(&rewrite.content));
    assert_eq!(rules[1].rewrite(content).unwrap().replacements, 0);
}

#[test]
fn test_each_expands_cartesian_product_in_order() {
    let mut rule = SubstitutionRule::replace("{{ dir }}/{{ name }}.rb", "{{ name }}", "x");
    rule.each.insert("dir".to_string(), vec!["a".to_string(), "b".to_string()]);
    rule.each.insert("name".to_string(), vec!["c".to_string(), "d".to_string()]);
    let rule = rule.with_id("pair");

    let expanded = rule.expand(&MiniJinjaRenderer::new()).unwrap();
    let ids: Vec<String> = expanded.iter().map(|r| r.label()).collect();
    assert_eq!(
        ids,
        vec![
            "pair[dir=a,name=c]",
            "pair[dir=a,name=d]",
            "pair[dir=b,name=c]",
            "pair[dir=b,name=d]",
        ]
    );
    assert_eq!(expanded[1].files.patterns().to_vec(), vec!["a/d.rb".to_string()]);
    assert_eq!(expanded[1].pattern, "d");
    assert!(expanded.iter().all(|r| r.each.is_empty()));
}

#[test]
fn test_each_rejects_template_syntax_in_patterns() {
    let mut rule = SubstitutionRule::replace("lib/{{ v }}.rb", r"[{#]{{ v }}", "x").with_id("hash-brace");
    rule.each.insert("v".to_string(), vec!["v1".to_string()]);
    let issues = rule.issues();
    assert_eq!(issues.len(), 1, "{issues:?}");
    assert!(matches!(&issues[0], ValidationIssue::InvalidRule { rule, .. } if rule == "hash-brace"));

    let rule = SubstitutionRule::replace("lib/v1.rb", r"[{#]v1", "x");
    assert!(rule.issues().is_empty());
}

#[test]
fn test_template_expands_named_groups() {
    let rule = SubstitutionRule::replace("*.rb", r#"gem "(?P<name>[\w-]+)""#, r#"gem "${name}-ext""#)
        .compile()
        .unwrap();
    let rewrite = rule.rewrite("gem \"a\"\ngem \"b\"\n").unwrap();
    assert_eq!(rewrite.content, "gem \"a-ext\"\ngem \"b-ext\"\n");
    assert_eq!(rewrite.replacements, 2);
}

#[test]
fn test_invalid_pattern() {
    let result = SubstitutionRule::replace("*.rb", "(unclosed", "x").compile();
    assert!(matches!(result, Err(Error::PatternError { .. })));

    let result = SubstitutionRule::replace("*.rb", "x", "y")
        .with_precondition(Precondition::Contains("[".to_string()))
        .compile();
    assert!(matches!(result, Err(Error::PatternError { .. })));
}

#[test]
fn test_invalid_glob() {
    let result = SubstitutionRule::replace("lib/[.rb", "x", "y").compile();
    assert!(matches!(result, Err(Error::GlobError(_))));
}

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

#[test_log::test]
fn test_apply_rewrites_only_changed_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let a = write(root, "lib/a.rb", "# {foo}\n");
    write(root, "lib/b.rb", "# nothing\n");
    write(root, "README.md", "# {foo}\n");

    let rule = SubstitutionRule::replace("lib/**/*.rb", r"\{foo\}", "{bar}")
        .with_id("foo-bar")
        .compile()
        .unwrap();
    let outcome = rule.apply(root).unwrap();

    assert_eq!(outcome.rule, "foo-bar");
    assert_eq!(outcome.files_selected, 2);
    assert_eq!(outcome.changed, vec![PathBuf::from("lib/a.rb")]);
    assert_eq!(outcome.replacements, 1);
    assert_eq!(outcome.to_string(), "1 replacement(s) in 1 of 2 file(s)");
    assert_eq!(fs::read_to_string(a).unwrap(), "# {bar}\n");
    assert_eq!(fs::read_to_string(root.join("README.md")).unwrap(), "# {foo}\n");
}

#[test_log::test]
fn test_apply_respects_precondition() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "lib/a.rb", "marker\nold\n");
    write(root, "lib/b.rb", "old\n");

    let rule = SubstitutionRule::replace("lib/*.rb", "old", "new")
        .with_precondition(Precondition::Contains("^marker$".to_string()))
        .compile()
        .unwrap();
    let outcome = rule.apply(root).unwrap();

    assert_eq!(outcome.changed, vec![PathBuf::from("lib/a.rb")]);
    assert_eq!(fs::read_to_string(root.join("lib/b.rb")).unwrap(), "old\n");
}

#[test]
fn test_apply_without_matching_files_fails() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "lib/a.py", "x");

    let rule = SubstitutionRule::transform("lib/**/*.rb", "x", Transform::EscapeBraces)
        .with_id("escape")
        .compile()
        .unwrap();
    match rule.apply(temp_dir.path()) {
        Err(Error::NoMatchingFilesError { rule, patterns }) => {
            assert_eq!(rule, "escape");
            assert_eq!(patterns, vec!["lib/**/*.rb"]);
        }
        other => panic!("Expected NoMatchingFilesError, got {other:?}"),
    }
}
