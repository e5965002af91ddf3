use dosescript_core::lang::FunctionSignature;
use tower_lsp::lsp_types::{Documentation, ParameterInformation, ParameterLabel, SignatureInformation};

pub(crate) fn signature_info(function: &FunctionSignature, active: usize) -> SignatureInformation {
    let parameters = function
        .params
        .iter()
        .map(|p| ParameterInformation {
            label: ParameterLabel::Simple(format!("{}{}: {}", p.name, if p.optional { "?" } else { "" }, p.kind)),
            documentation: None,
        })
        .collect::<Vec<_>>();
    let active = (!parameters.is_empty()).then(|| active.min(parameters.len() - 1) as u32);
    SignatureInformation {
        label: function.label(),
        documentation: Some(Documentation::String(function.description.to_string())),
        parameters: Some(parameters),
        active_parameter: active,
    }
}

/// Signature for a function declared in the script itself; only parameter names are known.
pub(crate) fn script_signature_info(name: &str, params: Vec<String>, active: usize) -> SignatureInformation {
    let active = (!params.is_empty()).then(|| active.min(params.len() - 1) as u32);
    SignatureInformation {
        label: format!("{}({})", name, params.join(", ")),
        documentation: Some(Documentation::String("Declared in this script".to_string())),
        parameters: Some(
            params
                .into_iter()
                .map(|p| ParameterInformation {
                    label: ParameterLabel::Simple(p),
                    documentation: None,
                })
                .collect(),
        ),
        active_parameter: active,
    }
}
