//! Logical action kinds used to assemble workflows.
//!
//! Each recognised shape is parsed into its own variant with a typed payload.
//! Anything else is carried through untouched as [`LogicalAction::Unrecognized`].

use serde_json::{json, Value};

use super::ids::IdGenerator;
use crate::models::Action;

pub mod identifiers {
    pub const COMMENT: &str = "is.workflow.actions.comment";
    pub const DETECT_DICTIONARY: &str = "is.workflow.actions.detect.dictionary";
    pub const GET_VALUE_FOR_KEY: &str = "is.workflow.actions.getvalueforkey";
    pub const CONDITIONAL: &str = "is.workflow.actions.conditional";
    pub const SET_VARIABLE: &str = "is.workflow.actions.setvariable";
    pub const FILE_SAVE: &str = "is.workflow.actions.documentpicker.save";
    pub const BASE64_ENCODE: &str = "is.workflow.actions.base64encode";
    pub const EXIT: &str = "is.workflow.actions.exit";
    pub const OUTPUT: &str = "is.workflow.actions.output";
    pub const DICTIONARY: &str = "is.workflow.actions.dictionary";

    pub const ALL: [&str; 10] = [
        COMMENT,
        DETECT_DICTIONARY,
        GET_VALUE_FOR_KEY,
        CONDITIONAL,
        SET_VARIABLE,
        FILE_SAVE,
        BASE64_ENCODE,
        EXIT,
        OUTPUT,
        DICTIONARY,
    ];
}

use identifiers::*;

const CONTROL_FLOW_START: u64 = 0;
const CONTROL_FLOW_END: u64 = 2;
const CONDITION_EQUALS: u64 = 4;
/// Object replacement character: the slot an attachment occupies in a text token.
const ATTACHMENT_CHAR: &str = "\u{fffc}";
const ATTACHMENT_RANGE: &str = "{0, 1}";

/// Value of a constant dictionary entry: text, or one level of nested text.
#[derive(Debug, Clone, PartialEq)]
pub enum DictionaryValue {
    Text(String),
    Nested(Vec<(String, String)>),
}

/// Ordered entries of a constant dictionary.
pub type DictionaryData = Vec<(String, DictionaryValue)>;

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalAction {
    Comment {
        text: String,
    },
    /// Parse the shortcut's input as a dictionary.
    DictionaryInput {
        uuid: String,
    },
    GetValueForKey {
        dictionary_id: String,
        dictionary_key: Option<String>,
        key: String,
        uuid: String,
    },
    IfOutputEquals {
        output_id: String,
        value: String,
        grouping_id: String,
    },
    EndIf {
        uuid: String,
        grouping_id: String,
    },
    SetVariable {
        output_id: String,
        variable_name: String,
    },
    FileSave {
        output_id: String,
        file_path: String,
    },
    Base64Encode {
        output_id: String,
        uuid: String,
    },
    Exit,
    OutputAndExit {
        output_id: String,
    },
    Dictionary {
        data: DictionaryData,
    },
    Unrecognized(Action),
}

/// Whether `identifier` names one of the logical kinds. Only the identifier is checked.
pub fn is_logical_identifier(identifier: &str) -> bool {
    identifiers::ALL.contains(&identifier)
}

impl LogicalAction {
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment { text: text.into() }
    }

    pub fn dictionary_input(ids: &mut dyn IdGenerator) -> Self {
        Self::DictionaryInput { uuid: ids.next_id() }
    }

    pub fn get_value_for_key(
        ids: &mut dyn IdGenerator,
        dictionary_id: impl Into<String>,
        dictionary_key: Option<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::GetValueForKey {
            dictionary_id: dictionary_id.into(),
            dictionary_key,
            key: key.into(),
            uuid: ids.next_id(),
        }
    }

    pub fn if_output_equals(
        ids: &mut dyn IdGenerator,
        output_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::IfOutputEquals {
            output_id: output_id.into(),
            value: value.into(),
            grouping_id: ids.next_id(),
        }
    }

    pub fn end_if(ids: &mut dyn IdGenerator, grouping_id: impl Into<String>) -> Self {
        Self::EndIf {
            uuid: ids.next_id(),
            grouping_id: grouping_id.into(),
        }
    }

    pub fn set_variable(output_id: impl Into<String>, variable_name: impl Into<String>) -> Self {
        Self::SetVariable {
            output_id: output_id.into(),
            variable_name: variable_name.into(),
        }
    }

    pub fn file_save(output_id: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self::FileSave {
            output_id: output_id.into(),
            file_path: file_path.into(),
        }
    }

    pub fn base64_encode(ids: &mut dyn IdGenerator, output_id: impl Into<String>) -> Self {
        Self::Base64Encode {
            output_id: output_id.into(),
            uuid: ids.next_id(),
        }
    }

    pub fn output_and_exit(output_id: impl Into<String>) -> Self {
        Self::OutputAndExit {
            output_id: output_id.into(),
        }
    }

    pub fn dictionary(data: DictionaryData) -> Self {
        Self::Dictionary { data }
    }

    /// Identifier other actions reference this action's output by.
    pub fn output_id(&self) -> Option<&str> {
        match self {
            Self::DictionaryInput { uuid }
            | Self::GetValueForKey { uuid, .. }
            | Self::Base64Encode { uuid, .. } => Some(uuid),
            Self::Unrecognized(action) => action.uuid(),
            _ => None,
        }
    }

    /// Grouping identifier shared by a conditional and its end marker.
    pub fn grouping_id(&self) -> Option<&str> {
        match self {
            Self::IfOutputEquals { grouping_id, .. } | Self::EndIf { grouping_id, .. } => {
                Some(grouping_id)
            }
            _ => None,
        }
    }

    pub fn to_action(&self) -> Action {
        match self {
            Self::Comment { text } => Action::new(COMMENT, json!({ "WFCommentActionText": text })),
            Self::DictionaryInput { uuid } => Action::new(
                DETECT_DICTIONARY,
                json!({
                    "WFInput": {
                        "Value": { "Type": "ExtensionInput" },
                        "WFSerializationType": "WFTextTokenAttachment",
                    },
                    "UUID": uuid,
                }),
            ),
            Self::GetValueForKey {
                dictionary_id,
                dictionary_key,
                key,
                uuid,
            } => {
                let mut value = json!({ "OutputUUID": dictionary_id, "Type": "ActionOutput" });
                if let Some(dictionary_key) = dictionary_key {
                    value["Aggrandizements"] = json!([{
                        "DictionaryKey": dictionary_key,
                        "Type": "WFDictionaryValueVariableAggrandizement",
                    }]);
                }
                Action::new(
                    GET_VALUE_FOR_KEY,
                    json!({
                        "WFInput": {
                            "Value": value,
                            "WFSerializationType": "WFTextTokenAttachment",
                        },
                        "UUID": uuid,
                        "WFDictionaryKey": key,
                    }),
                )
            }
            Self::IfOutputEquals {
                output_id,
                value,
                grouping_id,
            } => Action::new(
                CONDITIONAL,
                json!({
                    "WFInput": {
                        "Type": "Variable",
                        "Variable": {
                            "Value": {
                                "Type": "ActionOutput",
                                "OutputUUID": output_id,
                                "Aggrandizements": [{
                                    "Type": "WFCoercionVariableAggrandizement",
                                    "CoercionItemClass": "WFStringContentItem",
                                }],
                            },
                            "WFSerializationType": "WFTextTokenAttachment",
                        },
                    },
                    "WFControlFlowMode": CONTROL_FLOW_START,
                    "WFConditionalActionString": value,
                    "GroupingIdentifier": grouping_id,
                    "WFCondition": CONDITION_EQUALS,
                }),
            ),
            Self::EndIf { uuid, grouping_id } => Action::new(
                CONDITIONAL,
                json!({
                    "UUID": uuid,
                    "GroupingIdentifier": grouping_id,
                    "WFControlFlowMode": CONTROL_FLOW_END,
                }),
            ),
            Self::SetVariable {
                output_id,
                variable_name,
            } => Action::new(
                SET_VARIABLE,
                json!({
                    "WFInput": {
                        "Value": { "OutputUUID": output_id, "Type": "ActionOutput" },
                        "WFSerializationType": "WFTextTokenAttachment",
                    },
                    "WFVariableName": variable_name,
                }),
            ),
            Self::FileSave {
                output_id,
                file_path,
            } => Action::new(
                FILE_SAVE,
                json!({
                    "WFInput": {
                        "Value": { "OutputUUID": output_id, "Type": "ActionOutput" },
                    },
                    "WFSaveFileOverwrite": true,
                    "WFAskWhereToSave": false,
                    "WFFileDestinationPath": file_path,
                }),
            ),
            Self::Base64Encode { output_id, uuid } => Action::new(
                BASE64_ENCODE,
                json!({
                    "UUID": uuid,
                    "WFInput": {
                        "Value": { "OutputUUID": output_id, "Type": "ActionOutput" },
                        "WFSerializationType": "WFTextTokenAttachment",
                    },
                }),
            ),
            Self::Exit => Action::new(EXIT, json!({})),
            Self::OutputAndExit { output_id } => Action::new(
                OUTPUT,
                json!({
                    "WFOutput": {
                        "Value": {
                            "attachmentsByRange": {
                                ATTACHMENT_RANGE: { "Type": "ActionOutput", "OutputUUID": output_id },
                            },
                            "string": ATTACHMENT_CHAR,
                        },
                        "WFSerializationType": "WFTextTokenString",
                    },
                }),
            ),
            Self::Dictionary { data } => Action::new(
                DICTIONARY,
                json!({
                    "WFItems": {
                        "Value": {
                            "WFDictionaryFieldValueItems": data
                                .iter()
                                .map(|(key, value)| dictionary_item(key, value))
                                .collect::<Vec<_>>(),
                        },
                        "WFSerializationType": "WFDictionaryFieldValue",
                    },
                }),
            ),
            Self::Unrecognized(action) => action.clone(),
        }
    }

    /// Classify `action`; shapes that do not match a known kind exactly are
    /// returned as [`LogicalAction::Unrecognized`].
    pub fn from_action(action: &Action) -> Self {
        let params = action.parameters_node();
        let parsed = match action.identifier.as_str() {
            COMMENT => text_at(&params, "/WFCommentActionText").map(|text| Self::Comment { text }),
            DETECT_DICTIONARY => parse_dictionary_input(&params),
            GET_VALUE_FOR_KEY => parse_get_value_for_key(&params),
            CONDITIONAL => parse_conditional(&params),
            SET_VARIABLE => parse_set_variable(&params),
            FILE_SAVE => parse_file_save(&params),
            BASE64_ENCODE => parse_base64_encode(&params),
            EXIT if action.parameters.is_empty() => Some(Self::Exit),
            OUTPUT => parse_output(&params),
            DICTIONARY => parse_dictionary(&params).map(|data| Self::Dictionary { data }),
            _ => None,
        };
        parsed.unwrap_or_else(|| Self::Unrecognized(action.clone()))
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<LogicalAction> for Action {
    fn from(logical: LogicalAction) -> Self {
        match logical {
            LogicalAction::Unrecognized(action) => action,
            other => other.to_action(),
        }
    }
}

fn text_at(params: &Value, pointer: &str) -> Option<String> {
    params.pointer(pointer)?.as_str().map(str::to_string)
}

fn is_literal(params: &Value, pointer: &str, expected: &str) -> bool {
    params.pointer(pointer).and_then(Value::as_str) == Some(expected)
}

fn number_at(params: &Value, pointer: &str) -> Option<u64> {
    params.pointer(pointer)?.as_u64()
}

fn parse_dictionary_input(params: &Value) -> Option<LogicalAction> {
    if !is_literal(params, "/WFInput/Value/Type", "ExtensionInput")
        || !is_literal(params, "/WFInput/WFSerializationType", "WFTextTokenAttachment")
    {
        return None;
    }
    Some(LogicalAction::DictionaryInput {
        uuid: text_at(params, "/UUID")?,
    })
}

fn parse_get_value_for_key(params: &Value) -> Option<LogicalAction> {
    if !is_literal(params, "/WFInput/Value/Type", "ActionOutput") {
        return None;
    }
    let dictionary_key = match params.pointer("/WFInput/Value/Aggrandizements") {
        None => None,
        Some(Value::Array(items)) if items.is_empty() => None,
        Some(Value::Array(items)) => {
            let first = &items[0];
            if !is_literal(first, "/Type", "WFDictionaryValueVariableAggrandizement") {
                return None;
            }
            Some(text_at(first, "/DictionaryKey")?)
        }
        Some(_) => return None,
    };
    Some(LogicalAction::GetValueForKey {
        dictionary_id: text_at(params, "/WFInput/Value/OutputUUID")?,
        dictionary_key,
        key: text_at(params, "/WFDictionaryKey")?,
        uuid: text_at(params, "/UUID")?,
    })
}

fn parse_conditional(params: &Value) -> Option<LogicalAction> {
    match number_at(params, "/WFControlFlowMode")? {
        CONTROL_FLOW_START => {
            if !is_literal(params, "/WFInput/Type", "Variable")
                || number_at(params, "/WFCondition")? != CONDITION_EQUALS
            {
                return None;
            }
            Some(LogicalAction::IfOutputEquals {
                output_id: text_at(params, "/WFInput/Variable/Value/OutputUUID")?,
                value: text_at(params, "/WFConditionalActionString")?,
                grouping_id: text_at(params, "/GroupingIdentifier")?,
            })
        }
        CONTROL_FLOW_END => Some(LogicalAction::EndIf {
            uuid: text_at(params, "/UUID")?,
            grouping_id: text_at(params, "/GroupingIdentifier")?,
        }),
        _ => None,
    }
}

fn parse_set_variable(params: &Value) -> Option<LogicalAction> {
    if !is_literal(params, "/WFInput/Value/Type", "ActionOutput") {
        return None;
    }
    Some(LogicalAction::SetVariable {
        output_id: text_at(params, "/WFInput/Value/OutputUUID")?,
        variable_name: text_at(params, "/WFVariableName")?,
    })
}

fn parse_file_save(params: &Value) -> Option<LogicalAction> {
    if params.pointer("/WFSaveFileOverwrite") != Some(&Value::Bool(true))
        || params.pointer("/WFAskWhereToSave") != Some(&Value::Bool(false))
    {
        return None;
    }
    Some(LogicalAction::FileSave {
        output_id: text_at(params, "/WFInput/Value/OutputUUID")?,
        file_path: text_at(params, "/WFFileDestinationPath")?,
    })
}

fn parse_base64_encode(params: &Value) -> Option<LogicalAction> {
    if !is_literal(params, "/WFInput/Value/Type", "ActionOutput") {
        return None;
    }
    Some(LogicalAction::Base64Encode {
        output_id: text_at(params, "/WFInput/Value/OutputUUID")?,
        uuid: text_at(params, "/UUID")?,
    })
}

fn parse_output(params: &Value) -> Option<LogicalAction> {
    if !is_literal(params, "/WFOutput/WFSerializationType", "WFTextTokenString") {
        return None;
    }
    let attachments = params
        .pointer("/WFOutput/Value/attachmentsByRange")?
        .as_object()?;
    let first = attachments.values().next()?;
    if !is_literal(first, "/Type", "ActionOutput") {
        return None;
    }
    Some(LogicalAction::OutputAndExit {
        output_id: text_at(first, "/OutputUUID")?,
    })
}

fn dictionary_item(key: &str, value: &DictionaryValue) -> Value {
    let key_token = json!({
        "Value": { "string": key },
        "WFSerializationType": "WFTextTokenString",
    });
    match value {
        DictionaryValue::Text(text) => json!({
            "WFItemType": 0,
            "WFKey": key_token,
            "WFValue": {
                "Value": { "string": text },
                "WFSerializationType": "WFTextTokenString",
            },
        }),
        DictionaryValue::Nested(entries) => json!({
            "WFItemType": 1,
            "WFKey": key_token,
            "WFValue": {
                "Value": {
                    "WFDictionaryFieldValueItems": entries
                        .iter()
                        .map(|(k, v)| dictionary_item(k, &DictionaryValue::Text(v.clone())))
                        .collect::<Vec<_>>(),
                },
                "WFSerializationType": "WFDictionaryFieldValue",
            },
        }),
    }
}

/// Read the constant data back out of a dictionary action's parameters.
fn parse_dictionary(params: &Value) -> Option<DictionaryData> {
    if !is_literal(params, "/WFItems/WFSerializationType", "WFDictionaryFieldValue") {
        return None;
    }
    params
        .pointer("/WFItems/Value/WFDictionaryFieldValueItems")?
        .as_array()?
        .iter()
        .map(|item| {
            let key = text_at(item, "/WFKey/Value/string")?;
            let value = match number_at(item, "/WFItemType")? {
                0 => DictionaryValue::Text(text_at(item, "/WFValue/Value/string")?),
                1 => DictionaryValue::Nested(
                    item.pointer("/WFValue/Value/WFDictionaryFieldValueItems")?
                        .as_array()?
                        .iter()
                        .map(|inner| {
                            if number_at(inner, "/WFItemType")? != 0 {
                                return None;
                            }
                            Some((
                                text_at(inner, "/WFKey/Value/string")?,
                                text_at(inner, "/WFValue/Value/string")?,
                            ))
                        })
                        .collect::<Option<Vec<_>>>()?,
                ),
                _ => return None,
            };
            Some((key, value))
        })
        .collect()
}
