// XML documents exchanged with the job dispatcher.
// The same element shapes appear in REST bodies and inside SOAP responses.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::models::{ParameterDetails, ParameterValue, ResultType};
use crate::types::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct WsParameters {
    #[serde(rename = "id", default)]
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WsResultTypes {
    #[serde(rename = "type", default)]
    types: Vec<ResultType>,
}

#[derive(Debug, Deserialize)]
struct WsParameterDetails {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    values: Option<WsValues>,
}

#[derive(Debug, Deserialize)]
struct WsValues {
    #[serde(rename = "value", default)]
    values: Vec<WsValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsValue {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    default_value: bool,
    #[serde(default)]
    properties: Option<WsProperties>,
}

#[derive(Debug, Deserialize)]
struct WsProperties {
    #[serde(rename = "property", default)]
    properties: Vec<WsProperty>,
}

#[derive(Debug, Deserialize)]
struct WsProperty {
    key: String,
    #[serde(default)]
    value: String,
}

/// `<parameters><id>sequence</id>...</parameters>`
pub fn parse_parameters(xml: &str) -> AppResult<Vec<String>> {
    let doc: WsParameters = quick_xml::de::from_str(xml)?;
    Ok(doc.ids.into_iter().map(|id| id.trim().to_string()).collect())
}

/// `<types><type><identifier>out</identifier>...</type>...</types>`
pub fn parse_result_types(xml: &str) -> AppResult<Vec<ResultType>> {
    let doc: WsResultTypes = quick_xml::de::from_str(xml)?;
    Ok(doc.types)
}

/// `<parameter><name>..</name><type>..</type><values><value>..</value></values></parameter>`
pub fn parse_parameter_details(xml: &str) -> AppResult<ParameterDetails> {
    let doc: WsParameterDetails = quick_xml::de::from_str(xml)?;
    let values = doc
        .values
        .map(|v| v.values)
        .unwrap_or_default()
        .into_iter()
        .map(|v| ParameterValue {
            label: v.label,
            value: v.value,
            default_value: v.default_value,
            properties: v
                .properties
                .map(|p| p.properties)
                .unwrap_or_default()
                .into_iter()
                .map(|p| (p.key, p.value))
                .collect(),
        })
        .collect();

    Ok(ParameterDetails {
        name: doc.name,
        description: doc.description,
        kind: doc.kind,
        values,
    })
}

/// Inner markup of the first element named `local_name`, wrapped in a
/// neutral root so it can be fed to the parsers above. Namespace prefixes on
/// the matched element are ignored.
pub fn element_fragment(xml: &str, local_name: &str) -> AppResult<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == local_name.as_bytes() => {
                let end = e.to_end().into_owned();
                let span = reader.read_to_end(end.name())?;
                let inner = &xml[span.start as usize..span.end as usize];
                return Ok(format!("<{0}>{1}</{0}>", local_name, inner));
            }
            Event::Empty(e) if e.local_name().as_ref() == local_name.as_bytes() => {
                return Ok(format!("<{0}></{0}>", local_name));
            }
            Event::Eof => {
                return Err(AppError::Xml(format!("element <{}> not found", local_name)));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<parameters>
  <id>program</id>
  <id>task</id>
  <id>sequence</id>
</parameters>"#;
        assert_eq!(parse_parameters(xml).unwrap(), vec!["program", "task", "sequence"]);
    }

    #[test]
    fn test_parse_result_types() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<types>
  <type>
    <identifier>out</identifier>
    <label>Tool Output</label>
    <description>The output from the tool itself</description>
    <mediaType>text/plain</mediaType>
    <fileSuffix>txt</fileSuffix>
  </type>
  <type>
    <identifier>visual-png</identifier>
    <label>Visual Output (PNG)</label>
    <mediaType>image/png</mediaType>
    <fileSuffix>png</fileSuffix>
  </type>
</types>"#;
        let types = parse_result_types(xml).unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].identifier, "out");
        assert_eq!(types[0].label.as_deref(), Some("Tool Output"));
        assert_eq!(types[1].identifier, "visual-png");
        assert_eq!(types[1].description, None);
        assert_eq!(types[1].media_type, "image/png");
        assert_eq!(types[1].file_suffix, "png");
    }

    #[test]
    fn test_parse_parameter_details() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<parameter>
  <name>Matrix</name>
  <description>Scoring matrix</description>
  <type>STRING</type>
  <values>
    <value>
      <label>BLOSUM62</label>
      <value>BLOSUM62</value>
      <defaultValue>true</defaultValue>
      <properties>
        <property><key>gapopen</key><value>11</value></property>
      </properties>
    </value>
    <value>
      <label>PAM30</label>
      <value>PAM30</value>
      <defaultValue>false</defaultValue>
    </value>
  </values>
</parameter>"#;
        let details = parse_parameter_details(xml).unwrap();
        assert_eq!(details.name, "Matrix");
        assert_eq!(details.kind.as_deref(), Some("STRING"));
        assert_eq!(details.values.len(), 2);
        assert!(details.values[0].default_value);
        assert_eq!(details.values[0].properties, vec![("gapopen".to_string(), "11".to_string())]);
        assert!(!details.values[1].default_value);
        assert_eq!(details.values[1].value.as_deref(), Some("PAM30"));
    }

    #[test]
    fn test_element_fragment_ignores_prefixes() {
        let xml = r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"><S:Body>
<ns2:getParametersResponse xmlns:ns2="http://soap.jdispatcher.ebi.ac.uk">
<parameters><id>sequence</id><id>stype</id></parameters>
</ns2:getParametersResponse></S:Body></S:Envelope>"#;
        let fragment = element_fragment(xml, "parameters").unwrap();
        assert_eq!(parse_parameters(&fragment).unwrap(), vec!["sequence", "stype"]);
        assert!(element_fragment(xml, "resultTypes").is_err());
    }
}
