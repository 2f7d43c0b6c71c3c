mod common;

use common::{options, options_with, parse, texts};
use pretty_assertions::assert_eq;
use sqlscript::{BatchParser, ExecutionMode, ScriptContext};

#[test]
fn test_go_with_repeat_count() {
    let batches = parse("SELECT 1\nGO 3", &options(ExecutionMode::Normal)).unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].text, "SELECT 1\n");
    assert_eq!(batches[0].exec_count, 3);
}

#[test]
fn test_go_is_case_insensitive_and_trailing_content_forms_batch() {
    let batches = parse("A\ngo\nB\nGo\nC", &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(texts(&batches), vec!["A\n", "B\n", "C"]);
    assert!(batches.iter().all(|b| b.exec_count == 1));
}

#[test]
fn test_empty_batches_are_dropped() {
    let sql = "PRINT('Start');\r\nGO\r\nGO   \r    go\n  Go  \n   GO 10000   \r\nPRINT('End');\r\nGO\r\n";
    let batches = parse(sql, &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(texts(&batches), vec!["PRINT('Start');\r\n", "PRINT('End');\r\n"]);
}

#[test]
fn test_whitespace_only_lines_are_content() {
    let sql = "PRINT('Start');\r\n\t\r\nGO\n\nGO   \r  \n\t\t\n\r  go\n  Go  \n\r\n\r\n   GO 10000   \r\nPRINT('End');\r\nGO\r\n";
    let batches = parse(sql, &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(batches.len(), 5);
    assert_eq!(batches[1].text, "\n");
    assert_eq!(batches[3].text, "\r\n\r\n");
    assert_eq!(batches[3].exec_count, 10000);
}

#[test]
fn test_go_inside_comments_is_ignored() {
    let sql = "PRINT('Start');\r\n-- GO 7\r\nGO\r\n/*\r\nGO 15\r\n*/\r\nGO\r\n/*\r\nGO 4\r\nGO\r\n/*\r\nGO\r\n/* GO 17 -- */\r\n*/\r\nGO\r\n-- */\r\nGO\r\nPRINT('End');\r\n";
    let batches = parse(sql, &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(batches.len(), 4);
    assert_eq!(batches[0].text, "PRINT('Start');\r\n-- GO 7\r\n");
    assert!(batches.iter().all(|b| b.exec_count == 1));
    assert_eq!(batches[3].text, "PRINT('End');\r\n");
}

#[test]
fn test_go_inside_single_quoted_string_is_ignored() {
    let sql = "PRINT('Line1\nGO\n/* still inside string */\n''escaped quote''');\nGO";
    let batches = parse(sql, &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(batches.len(), 1);
    assert!(batches[0].text.contains("\nGO\n"));
    assert!(batches[0].text.contains("''escaped quote''"));
}

#[test]
fn test_go_inside_bracketed_identifier_is_ignored() {
    let sql = "SELECT [Column\nGO\n/* not a batch separator */\nName];\nGO";
    let batches = parse(sql, &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(batches.len(), 1);
    assert!(batches[0].text.contains("[Column"));
}

#[test]
fn test_go_followed_by_line_comment() {
    let batches = parse("SELECT 1\nGO 2 -- twice\nSELECT 2", &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(texts(&batches), vec!["SELECT 1\n", "-- twice\nSELECT 2"]);
    assert_eq!(batches[0].exec_count, 2);
}

#[test]
fn test_batch_start_positions() {
    let sql = "SELECT 1\nGO\n\n  -- note\nSELECT 2\nGO\n:SETVAR v 1\n    SELECT $(v)";
    let batches = parse(sql, &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!((batches[0].start_line, batches[0].start_column), (1, 1));
    assert_eq!((batches[1].start_line, batches[1].start_column), (3, 1));
    assert_eq!((batches[2].start_line, batches[2].start_column), (8, 1));
    assert_eq!(batches[2].text, "    SELECT 1");
}

#[test]
fn test_start_position_after_leading_literal() {
    let batches = parse("GO\n'abc' + x\nGO", &options(ExecutionMode::SqlCmd)).unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!((batches[0].start_line, batches[0].start_column), (2, 1));
}

#[test]
fn test_empty_script_has_no_batches() {
    assert!(parse("", &options(ExecutionMode::SqlCmd)).unwrap().is_empty());
    assert!(parse("GO\nGO 5\n", &options(ExecutionMode::SqlCmd)).unwrap().is_empty());
}

#[test]
fn test_batches_are_lazy() {
    let mut ctx = ScriptContext::new(&options(ExecutionMode::SqlCmd));
    let mut parser = BatchParser::for_script("SELECT 1\nGO\nSELECT 'open", &mut ctx);
    assert_eq!(parser.next().unwrap().unwrap().text, "SELECT 1\n");
    let err = parser.next().unwrap().unwrap_err();
    assert_eq!(err.position(), Some((3, 8)));
    assert!(parser.next().is_none());
}

#[test]
fn test_parsing_is_repeatable() {
    let sql = ":SETVAR a 1\nSELECT $(a), $(b)\nGO 2\n:SETVAR b 2\nSELECT $(a), $(b)\n";
    let opts = options_with(ExecutionMode::SqlCmd, &[("b", "0")]);
    let first = parse(sql, &opts).unwrap();
    let second = parse(sql, &opts).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].text, "SELECT 1, 0\n");
    assert_eq!(first[1].text, "SELECT 1, 2\n");
}

#[test]
fn test_custom_char_source() {
    let mut ctx = ScriptContext::new(&options(ExecutionMode::SqlCmd));
    let chars = "SELECT 1\nGO\nSELECT 2".chars().collect::<Vec<_>>().into_iter();
    let batches: Vec<_> = BatchParser::new(chars, &mut ctx)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(texts(&batches), vec!["SELECT 1\n", "SELECT 2"]);
}
