use crate::error::ParseError;
use crate::types::SpecDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: SpecDocument,
    pub format: DocumentFormat,
}

pub fn parse_document_str(input: &str, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    match format {
        DocumentFormat::Json => Ok(ParsedDocument {
            document: serde_json::from_str::<SpecDocument>(input)?,
            format,
        }),
        DocumentFormat::Yaml => Ok(ParsedDocument {
            document: serde_yaml::from_str::<SpecDocument>(input)?,
            format,
        }),
        DocumentFormat::Auto => parse_document_auto(input),
    }
}

fn parse_document_auto(input: &str) -> Result<ParsedDocument, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::UnknownFormat);
    }

    // JSON documents always open with `{` once leading whitespace is gone.
    if input.trim_start().starts_with('{') {
        return match serde_json::from_str::<SpecDocument>(input) {
            Ok(document) => Ok(ParsedDocument {
                document,
                format: DocumentFormat::Json,
            }),
            Err(json_err) => serde_yaml::from_str::<SpecDocument>(input)
                .map(|document| ParsedDocument {
                    document,
                    format: DocumentFormat::Yaml,
                })
                .map_err(|_| ParseError::Json(json_err)),
        };
    }

    match serde_yaml::from_str::<SpecDocument>(input) {
        Ok(document) => Ok(ParsedDocument {
            document,
            format: DocumentFormat::Yaml,
        }),
        Err(yaml_err) => serde_json::from_str::<SpecDocument>(input)
            .map(|document| ParsedDocument {
                document,
                format: DocumentFormat::Json,
            })
            .map_err(|_| ParseError::Yaml(yaml_err)),
    }
}
