//! Merging a request with a tool's defaults

use std::collections::BTreeMap;

use super::BuildTool;
use crate::models::BuildRequest;

/// Property listing the names of all forwarded properties, so a nested build
/// can forward them again
pub const FORWARD_PROPERTIES_PROPERTY: &str = "srcbuild.forwardProperties";

/// Full argument list for `request`, in this fixed order:
///
/// 1. the tool's default arguments, if the request asks for them
/// 2. the request's own build arguments
/// 3. verbosity arguments
/// 4. skip-tests arguments
/// 5. forwarded properties (see [`forward_properties_arguments`])
pub fn merge_arguments(tool: &dyn BuildTool, request: &BuildRequest) -> Vec<String> {
    let mut args = Vec::new();
    if request.add_default_build_arguments() {
        args.extend(tool.default_build_arguments());
    }
    args.extend(request.build_arguments().iter().cloned());
    args.extend(tool.verbosity_arguments(request.verbosity()));
    args.extend(tool.skip_tests_arguments(request.skip_tests()));
    args.extend(forward_properties_arguments(tool, request));
    args
}

/// One property token per forwarded value (sorted by key), then exactly one
/// token naming every forwarded property, comma-joined and possibly empty.
pub fn forward_properties_arguments(tool: &dyn BuildTool, request: &BuildRequest) -> Vec<String> {
    let names = request
        .forward_property_names()
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");

    request
        .forward_property_values()
        .iter()
        .map(|(key, value)| tool.property_argument(key, value))
        .chain(std::iter::once(
            tool.property_argument(FORWARD_PROPERTIES_PROPERTY, &names),
        ))
        .collect()
}

/// Environment for `request`: the tool's defaults (if requested) overlaid
/// with the request's variables, which win on conflict
pub fn merge_environment(
    tool: &dyn BuildTool,
    request: &BuildRequest,
) -> BTreeMap<String, String> {
    let mut env = if request.add_default_build_environment() {
        tool.default_build_environment()
    } else {
        BTreeMap::new()
    };
    env.extend(
        request
            .build_environment()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    env
}
