use scribe_core::ChangeKind;
use scribe_digest::build_digest;
use scribe_digest::parser::parse_change_records;
use scribe_digest::select::{Selection, TRUNCATION_MARKER};

fn section<'a>(text: &'a str, header: &str) -> &'a str {
    let start = text.find(header).unwrap() + header.len();
    let rest = &text[start..];
    match rest.find("\n### ") {
        Some(end) => &rest[..end],
        None => rest,
    }
}

#[test]
fn single_modified_file_within_budget() {
    let diff = "\
diff --git a/foo/a.go b/foo/a.go
index 3b18e51..a8c3f02 100644
--- a/foo/a.go
+++ b/foo/a.go
@@ -3 +3 @@ package foo
-const A = 1
+const A = 2
@@ -8 +8 @@ func B() {
-	return 1
+	return 2
@@ -12 +12 @@ func C() {
-	x := 1
+	x := 3
";
    let digest = build_digest(diff, "M\tfoo/a.go\n", 1000);

    assert!(digest.text.contains("Commit includes 1 files:"));
    assert!(digest.text.contains("- Modified: 1\n"));
    assert!(digest.text.contains("- Modified: foo/a.go\n"));
    assert_eq!(section(&digest.text, "### Modified: foo/a.go\n"), diff);
    assert_eq!(digest.report.files[0].selection, Selection::Verbatim);
}

#[test]
fn ten_files_with_tiny_budget_all_truncate() {
    let mut diff = String::new();
    let mut status = String::new();
    for i in 0..10 {
        let path = format!("pkg{i}/mod.py");
        diff.push_str(&format!(
            "diff --git a/{path} b/{path}\n\
             index 0000000..1111111 100644\n\
             --- a/{path}\n\
             +++ b/{path}\n\
             @@ -1,2 +1,2 @@\n\
             -x = {i}\n\
             +x = {}\n",
            i + 1
        ));
        status.push_str(&format!("M\t{path}\n"));
    }

    let digest = build_digest(&diff, &status, 40);
    let budget = digest.report.budget.unwrap();
    assert_eq!(budget.per_file, 3);
    assert_eq!(budget.char_budget(), 12);

    assert_eq!(digest.report.files.len(), 10);
    for file in &digest.report.files {
        assert_eq!(file.selection, Selection::Truncated { found: 0, kept: 0 });
    }
    assert_eq!(digest.text.matches(TRUNCATION_MARKER).count(), 10);
    assert!(!digest.text.contains("+x = 1\n"));
}

#[test]
fn rename_uses_new_path() {
    let diff = "\
diff --git a/old/x.py b/new/x.py
similarity index 100%
rename from old/x.py
rename to new/x.py
";
    let records = parse_change_records(diff, "R100\told/x.py\tnew/x.py\n");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "new/x.py");
    assert_eq!(records[0].kind, ChangeKind::Renamed);

    let digest = build_digest(diff, "R100\told/x.py\tnew/x.py\n", 1000);
    assert!(digest.text.contains("- Renamed: 1\n"));
    assert!(digest.text.contains("### Renamed: new/x.py\n"));
}

#[test]
fn empty_status_listing_gives_zero_files() {
    let digest = build_digest("", "", 1000);
    assert!(digest.text.starts_with("Commit includes 0 files:\n"));
    assert!(!digest.text.contains("### "));
}

#[test]
fn mixed_change_set_keeps_shape() {
    let diff = "\
diff --git a/assets/logo.png b/assets/logo.png
new file mode 100644
index 0000000..e69de29
Binary files /dev/null and b/assets/logo.png differ
diff --git a/legacy/util.js b/legacy/util.js
deleted file mode 100644
index 83db48f..0000000
--- a/legacy/util.js
+++ /dev/null
@@ -1,3 +0,0 @@
-function helper() {
-  return 1;
-}
diff --git a/src/server.ts b/src/server.ts
index 1111111..2222222 100644
--- a/src/server.ts
+++ b/src/server.ts
@@ -1,0 +1,2 @@
+import express from 'express';
+import cors from 'cors';
";
    let status = "A\tassets/logo.png\nD\tlegacy/util.js\nM\tsrc/server.ts\nM\tdocs/missing.md\n";
    let digest = build_digest(diff, status, 100_000);
    let text = &digest.text;

    assert!(text.contains("Commit includes 4 files:"));
    assert!(text.contains("- Added: 1\n- Modified: 2\n- Deleted: 1\n- Binary files: 1\n"));
    assert!(text.contains("Changes by directory:\n- assets: 1 files\n- docs: 1 files\n- legacy: 1 files\n- src: 1 files\n"));

    let binary = section(text, "### Added: assets/logo.png\n");
    assert!(!binary.contains("Binary files /dev/null"));
    assert_eq!(binary.lines().count(), 1);

    let deleted = section(text, "### Deleted: legacy/util.js\n");
    assert_eq!(deleted, "File was deleted.\n");

    assert!(section(text, "### Modified: src/server.ts\n").contains("+import cors from 'cors';"));
    assert_eq!(
        section(text, "### Modified: docs/missing.md\n"),
        "(No diff content available)\n"
    );
}

#[test]
fn truncated_file_surfaces_declarations() {
    let mut diff = String::from(
        "diff --git a/app/models.py b/app/models.py\n\
         index 1111111..2222222 100644\n\
         --- a/app/models.py\n\
         +++ b/app/models.py\n\
         @@ -1,0 +1,200 @@\n",
    );
    for i in 0..60 {
        diff.push_str(&format!("+    value_{i} = compute({i})\n"));
    }
    diff.push_str("+from dataclasses import dataclass\n");
    diff.push_str("+class Order:\n");
    diff.push_str("+    id: int\n");
    for i in 0..60 {
        diff.push_str(&format!("+    note_{i} = None\n"));
    }

    let digest = build_digest(&diff, "M\tapp/models.py\n", 200);
    let body = section(&digest.text, "### Modified: app/models.py\n");

    assert!(body.contains(TRUNCATION_MARKER));
    assert!(body.contains("Important changes:\n+from dataclasses import dataclass\n+class Order:\n---\n"));
    assert!(!body.contains("value_30"));
    assert!(body.len() < diff.len());
}
