use crate::error::RpcError;
use crate::rpc::RpcClient;

/// Version string of the connected node, e.g. `27.1.0` for a
/// `/Satoshi:27.1.0/` subversion.
pub async fn node_version(rpc: &RpcClient) -> Result<String, RpcError> {
    let info = rpc.get_network_info().await?.into_result()?;
    let subversion = info
        .get("subversion")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| RpcError::InvalidResponse {
            status: 200,
            message: "getnetworkinfo result has no subversion".to_owned(),
        })?;
    Ok(parse_subversion(subversion))
}

/// Strip the BIP-14 slashes and keep the text after the last `:`.
pub fn parse_subversion(subversion: &str) -> String {
    let stripped = subversion.replace('/', "");
    match stripped.rsplit_once(':') {
        Some((_, version)) => version.to_owned(),
        None => stripped,
    }
}
