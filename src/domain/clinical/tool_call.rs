//! Tool-call requests emitted by the reasoning step and their dispatch into
//! the clinical directory.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ClinicalDirectory;
use crate::domain::DomainError;

/// The tools bound to the triage reasoning configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    FindDoctorsBySpecialty,
    GetDoctorSchedule,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindDoctorsBySpecialty => "find_doctors_by_specialty",
            Self::GetDoctorSchedule => "get_doctor_schedule",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "find_doctors_by_specialty" => Some(Self::FindDoctorsBySpecialty),
            "get_doctor_schedule" => Some(Self::GetDoctorSchedule),
            _ => None,
        }
    }
}

/// One structured tool invocation request from the reasoning step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub tool: ToolName,
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, tool: ToolName, arguments: Value) -> Self {
        Self {
            id: id.into(),
            tool,
            arguments,
        }
    }
}

/// Execute one tool call against the directory and encode the result for the
/// conversation history.
pub async fn dispatch_tool_call(
    call: &ToolCallRequest,
    directory: &dyn ClinicalDirectory,
) -> Result<String, DomainError> {
    let result = match call.tool {
        ToolName::FindDoctorsBySpecialty => {
            let specialty = string_argument(&call.arguments, "specialty")?;
            let doctors = directory.find_doctors_by_specialty(&specialty).await?;
            serde_json::to_value(doctors)
        }
        ToolName::GetDoctorSchedule => {
            let name = string_argument(&call.arguments, "name")?;
            let doctors = directory.doctor_schedule(&name).await?;
            serde_json::to_value(doctors)
        }
    };

    let value =
        result.map_err(|e| DomainError::internal(format!("Tool result encoding failed: {}", e)))?;
    serde_json::to_string(&value)
        .map_err(|e| DomainError::internal(format!("Tool result encoding failed: {}", e)))
}

fn string_argument(arguments: &Value, key: &str) -> Result<String, DomainError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            DomainError::validation(format!("Tool call missing string argument '{}'", key))
        })
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockClinicalDirectory;
    use super::super::DoctorAvailability;
    use super::*;
    use serde_json::json;

    fn cardiologist() -> DoctorAvailability {
        DoctorAvailability {
            doctor_id: 3,
            name: "Dr. Menon".to_string(),
            specialty: None,
            qualification: "MD".to_string(),
            available_from: "09:00".to_string(),
            available_to: "13:00".to_string(),
            available_days: "Mon,Wed,Sun".to_string(),
        }
    }

    #[test]
    fn test_tool_name_wire_round_trip() {
        for tool in [ToolName::FindDoctorsBySpecialty, ToolName::GetDoctorSchedule] {
            assert_eq!(ToolName::from_wire(tool.as_str()), Some(tool));
        }
        assert_eq!(ToolName::from_wire("order_pizza"), None);
    }

    #[tokio::test]
    async fn test_dispatch_specialty_search() {
        let directory =
            MockClinicalDirectory::new().with_specialty("Cardiology", vec![cardiologist()]);

        let call = ToolCallRequest::new(
            "call-1",
            ToolName::FindDoctorsBySpecialty,
            json!({"specialty": "Cardiology"}),
        );

        let encoded = dispatch_tool_call(&call, &directory).await.unwrap();
        assert!(encoded.contains("Dr. Menon"));
        assert_eq!(
            directory.calls(),
            vec!["find_doctors_by_specialty:Cardiology".to_string()]
        );
    }

    #[tokio::test]
    async fn test_dispatch_rejects_missing_argument() {
        let directory = MockClinicalDirectory::new();
        let call = ToolCallRequest::new("call-1", ToolName::GetDoctorSchedule, json!({}));

        let result = dispatch_tool_call(&call, &directory).await;
        assert!(result.is_err());
        assert!(directory.calls().is_empty());
    }
}
