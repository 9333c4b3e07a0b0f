//! Redacted table output.

use std::fs;

use qof_ingest::MeasureFile;
use qof_model::SuppressionOptions;
use qof_report::{redacted_file_name, write_redacted_csv};
use qof_transform::{load_measure, redact_measure};
use tempfile::TempDir;

#[test]
fn redacted_table_keeps_layout_with_empty_cells() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("measure_ast_reg_sex.csv");
    fs::write(
        &path,
        "sex,ast_reg,population,value,date\n\
         F,2,120,0.0167,2019-03-01\n\
         M,40,130,0.3077,2019-03-01\n",
    )
    .unwrap();
    let file = MeasureFile {
        id: "ast_reg_sex".to_string(),
        path,
    };
    let frame = load_measure(&file, None).unwrap();
    let (redacted, report) = redact_measure(&frame, SuppressionOptions::default()).unwrap();
    assert!(report.numerator.partial);

    let out = dir.path().join("output");
    let written = write_redacted_csv(&out, &redacted).unwrap();
    assert_eq!(written, out.join(redacted_file_name("ast_reg_sex")));

    let contents = fs::read_to_string(written).unwrap();
    insta::assert_snapshot!(contents, @r###"
    sex,ast_reg,population,value,date
    F,,120,,2019-03-01
    M,40,130,0.3077,2019-03-01
    "###);
}
