//! Built-in language tables.
//!
//! Each table is returned as a [`LanguageDefinition`] so hosts can inspect it, export it to
//! JSON as a starting point for their own languages, or build it directly.

use textbox_core::StyleTag;

use crate::definition::{Delimiters, LanguageDefinition, PatternDefinition};

const CSHARP_KEYWORDS: &str = r"\b(public|private|protected|internal|class|struct|interface|enum|delegate|int|long|float|double|bool|char|string|object|byte|sbyte|short|ushort|uint|ulong|decimal|lock|new|override|virtual|abstract|sealed|static|readonly|extern|ref|out|in|params|using|namespace|true|false|null|this|base|operator|sizeof|typeof|stackalloc|nameof|async|await|volatile|unchecked|checked|unsafe|fixed|void|get|set|Byte|SByte|Short|UShort|Int|UInt|Long|ULong|Float|Double|Decimal)\b";

const CSHARP_CONTROL: &str = r"\b(if|else|switch|case|do|for|foreach|while|break|continue|return|goto|throw|try|catch|finally)\b";

const CSHARP_TYPE_DECLARATION: &str = r"\b(class|struct|enum|interface)\s+(?P<range>\w+?)\b";

const FUNCTION_CALL: &str = r"\b(?P<range>\w+)\s*\(";

const SQL_KEYWORDS: &str = r"\b(SELECT|CREATE|DATABASE|TABLE|ALTER|INDEX|DROP|VIEW|INSERT|UPDATE|DELETE|MERGE|GRANT|REVOKE|BEGIN|COMMIT|ROLLBACK|SAVEPOINT|TRANSACTION|USE|TRUNCATE|EXPLAIN|DESCRIBE|EXEC|EXECUTE|SET|SHOW|DECLARE|ADD|ALL|AND|ANY|AS|ASC|BACKUP|BETWEEN|CHECK|COLUMN|CONSTRAINT|DEFAULT|DESC|DISTINCT|END|EXISTS|FOREIGN|FROM|FULL|GROUP|HAVING|IN|INNER|INTO|IS|JOIN|KEY|LEFT|LIKE|LIMIT|NOT|NULL|OR|ORDER|OUTER|PRIMARY|PROCEDURE|RIGHT|ROWNUM|TOP|UNION|UNIQUE|VALUES|WHERE)\b";

const SQL_FUNCTIONS: &str = r"\b(CONCAT|LENGTH|LOWER|UPPER|SUBSTRING|TRIM|REPLACE|ABS|CEIL|FLOOR|ROUND|RAND|CURDATE|CURTIME|NOW|DATE_ADD|DATE_SUB|DATEDIFF|DAY|MONTH|YEAR|AVG|COUNT|MAX|MIN|SUM|USER|VERSION|LEN|LTRIM|RTRIM|CEILING|GETDATE|GETUTCDATE|DATEADD)\b";

const SQL_TYPES: &str = r"\b(TINYINT|SMALLINT|MEDIUMINT|INT|INTEGER|BIGINT|DECIMAL|FLOAT|DOUBLE|BIT|DATE|DATETIME|TIMESTAMP|TIME|YEAR|CHAR|VARCHAR|BINARY|VARBINARY|TINYBLOB|BLOB|MEDIUMBLOB|LONGBLOB|TINYTEXT|TEXT|MEDIUMTEXT|LONGTEXT|ENUM|DATETIME2|SMALLDATETIME|DATETIMEOFFSET|NCHAR|NVARCHAR|NTEXT|IMAGE|SQL_VARIANT)\b";

/// C#: braces, `#region` and `#if` folding, verbatim and raw strings.
pub fn csharp() -> LanguageDefinition {
    LanguageDefinition {
        line_comments: vec!["//".into()],
        block_comments: vec![Delimiters::new("/*", "*/")],
        strings: vec!["'".into(), "\"".into()],
        multiline_strings: vec![Delimiters::new("\"\"\"", "\"\"\"")],
        multiline_prefixes: vec!["@".into(), "@$".into()],
        foldings: vec![
            Delimiters::new("{", "}"),
            Delimiters::new("#region", "#endregion"),
            Delimiters::new("#if", "#endif"),
        ],
        patterns: vec![
            PatternDefinition::new(
                r"(\b0x[0-9a-fA-F]+\b|\b0b[01]+\b|\b0[0-7]+\b|\b\d+(\.\d+)?([eE][-+]?\d+)?[lLdDfF]?\b)",
                StyleTag::Numeric,
            ),
            PatternDefinition::new(
                r"\[\s*[a-zA-Z0-9_\.]+\s*(\([^\)]*\))?\s*\]",
                StyleTag::Attribute,
            ),
            PatternDefinition::new(CSHARP_TYPE_DECLARATION, StyleTag::Type),
            PatternDefinition::new(
                r"\b(?:public|private|protected|internal|static|virtual|override|abstract)\s+[\w<>\[\]]+\s+(?P<range>\w+)\s*\(",
                StyleTag::Function,
            ),
            PatternDefinition::new(FUNCTION_CALL, StyleTag::Function),
            PatternDefinition::new(CSHARP_KEYWORDS, StyleTag::Keyword),
            PatternDefinition::new(CSHARP_CONTROL, StyleTag::KeywordControl),
        ],
        ..LanguageDefinition::new("C#")
    }
}

/// .NET stack traces: file names, line numbers, namespaces and frames.
pub fn csharp_stack_trace() -> LanguageDefinition {
    LanguageDefinition {
        patterns: vec![
            PatternDefinition::new(r"\bin (?P<range>.*?):line", StyleTag::Comment),
            PatternDefinition::new(r":line\s+\d+", StyleTag::Constant),
            PatternDefinition::new(r"\bat\s+(?P<range>[\w.]+)\.[^.(]+", StyleTag::Namespace),
            PatternDefinition::new(r"[.>](?P<range>[^>.(]+)\(", StyleTag::Function),
            PatternDefinition::new(r"\(([^)]+)\)", StyleTag::Variable),
            PatternDefinition::new(CSHARP_TYPE_DECLARATION, StyleTag::Type),
            PatternDefinition::new(FUNCTION_CALL, StyleTag::Function),
            PatternDefinition::new(CSHARP_KEYWORDS, StyleTag::Keyword),
        ],
        ..LanguageDefinition::new("C# Stack Trace")
    }
}

/// JSON: object and array folding, keys styled apart from values.
pub fn json() -> LanguageDefinition {
    LanguageDefinition {
        foldings: vec![Delimiters::new("{", "}"), Delimiters::new("[", "]")],
        patterns: vec![
            PatternDefinition::new(r#""[^"]*""#, StyleTag::String),
            PatternDefinition::new(r#"(?P<range>"([^\\"]|\\")*")\s*:"#, StyleTag::Variable),
            PatternDefinition::new(r"-?\b\d+(\.\d+)?([eE][+-]?\d+)?\b", StyleTag::Numeric),
            PatternDefinition::new(r"\b(true|false|null)\b", StyleTag::Constant),
        ],
        ..LanguageDefinition::new("JSON")
    }
}

/// SQL: case-insensitive keywords, functions and types.
pub fn sql() -> LanguageDefinition {
    LanguageDefinition {
        line_comments: vec!["--".into(), "#".into()],
        block_comments: vec![Delimiters::new("/*", "*/")],
        strings: vec!["\"".into(), "'".into()],
        patterns: vec![
            PatternDefinition::ignore_case(SQL_KEYWORDS, StyleTag::Keyword),
            PatternDefinition::ignore_case(r"\b(IF|ELSE|WHILE|CASE)\b", StyleTag::KeywordControl),
            PatternDefinition::ignore_case(SQL_FUNCTIONS, StyleTag::Function),
            PatternDefinition::ignore_case(SQL_TYPES, StyleTag::Type),
        ],
        ..LanguageDefinition::new("SQL")
    }
}

/// Protocol Buffers.
pub fn proto() -> LanguageDefinition {
    LanguageDefinition {
        strings: vec!["\"".into()],
        foldings: vec![Delimiters::new("{", "}")],
        patterns: vec![
            PatternDefinition::new(r"\b(message|enum)\s+(?P<range>\w+?)\b", StyleTag::Type),
            PatternDefinition::new(
                r"\b(syntax|import|package|option|message|enum|service|rpc|returns|stream|map|oneof|reserved|extend|extensions|to|max|public|weak|proto3)\b",
                StyleTag::Keyword,
            ),
            PatternDefinition::new(
                r"\b(double|float|int32|int64|uint32|uint64|sint32|sint64|fixed32|fixed64|sfixed32|sfixed64|bool|string|bytes)\b",
                StyleTag::Keyword,
            ),
            PatternDefinition::new(
                r"\b(Double|Single|Int32|Int64|UInt32|UInt64|Boolean|String|Byte|Dictionary|List)\b",
                StyleTag::Keyword,
            ),
            PatternDefinition::new(r"\b(repeated|optional|required)\b", StyleTag::Attribute),
            PatternDefinition::new(r"\b\d+[\.]?\d*\b", StyleTag::Numeric),
        ],
        ..LanguageDefinition::new("Proto")
    }
}

/// No tokens and no patterns.
pub fn plain_text() -> LanguageDefinition {
    LanguageDefinition::new("Plain Text")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_builds() {
        for definition in [csharp(), csharp_stack_trace(), json(), sql(), proto(), plain_text()] {
            let name = definition.name.clone();
            let language = definition.build();
            assert!(language.is_ok(), "{name}: {language:?}");
        }
    }

    #[test]
    fn test_csharp_raw_string_precedes_plain_string() {
        let language = csharp().build().unwrap();
        let chars: Vec<char> = "\"\"\"x\"\"\"".chars().collect();
        let tokens = language.tokenize_line(&chars);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].len, 3);
    }
}
