// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use serde_json::{json, Value};

use crate::backends::stub::{EchoHandler, RecordingPlugin, ScriptedSigner};
use crate::backends::TransactionHandler;
use crate::client::Client;
use crate::config::ClientConfig;
use crate::errors::ErrorKind;
use crate::plugins::{Actions, PluginResult, RpcHandleContext, RpcOutcome};
use crate::request::{
    CallStatus, ContextState, DedupMode, ExecState, RequestContext, RequestKind, Resolution,
    ResponseStatus,
};
use crate::signer::SignatureSpec;
use crate::traits::Plugin;
use crate::utils::to_hex_prefixed;

/// Answers `test_balance` by requiring `eth_getBalance` for the same params.
struct BalanceLookup;

impl Plugin for BalanceLookup {
    fn name(&self) -> &'static str {
        "balance_lookup"
    }

    fn handle_rpc(&self, call: &mut RpcHandleContext<'_>) -> PluginResult<RpcOutcome> {
        if call.method() != "test_balance" {
            return Ok(crate::plugins::Handled::Declined);
        }
        let params = call.params().to_vec();
        call.req
            .require_sub_request("eth_getBalance", params, None, DedupMode::Structural)
            .map(RpcOutcome::Result)
            .into_handled()
    }
}

fn forwarding_client() -> Arc<Client> {
    let mut config = ClientConfig::default();
    config.forward.methods = vec!["eth_".to_string()];
    Client::from_config(config).unwrap()
}

/// Integration tests for contexts, sub-requests and signing driven by hand
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_polls_spawn_one_sub_request() {
        let client = forwarding_client();
        client.register(Actions::RPC_HANDLE, Arc::new(BalanceLookup));
        let mut ctx =
            RequestContext::new(&client, r#"{"method":"test_balance","params":["0xab","latest"]}"#)
                .unwrap();

        for _ in 0..5 {
            assert_eq!(ctx.advance(), ExecState::Waiting);
        }
        assert_eq!(ctx.required_len(), 1);
        assert_eq!(ctx.required()[0].method(0), Some("eth_getBalance"));
        assert_eq!(ctx.take_outgoing().len(), 1);
        assert!(ctx.take_outgoing().is_empty());
    }

    #[test]
    fn test_sub_request_result_is_harvested() {
        let client = forwarding_client();
        client.register(Actions::RPC_HANDLE, Arc::new(BalanceLookup));
        let mut ctx =
            RequestContext::new(&client, r#"{"id":4,"method":"test_balance","params":["0xab"]}"#)
                .unwrap();
        ctx.advance();
        let outgoing = ctx.take_outgoing();
        assert_eq!(outgoing[0].path, vec![0]);

        ctx.add_response_at(
            &outgoing[0].path,
            outgoing[0].index,
            ResponseStatus::Ok,
            br#"{"jsonrpc":"2.0","id":2,"result":"0x64"}"#,
        )
        .unwrap();
        assert_eq!(ctx.advance(), ExecState::Success);
        assert_eq!(ctx.result(0), Some(&json!("0x64")));
    }

    #[test]
    fn test_failed_sub_request_propagates_message_and_code() {
        let client = forwarding_client();
        client.register(Actions::RPC_HANDLE, Arc::new(BalanceLookup));
        let mut ctx =
            RequestContext::new(&client, r#"{"method":"test_balance","params":["0xab"]}"#).unwrap();
        ctx.advance();
        ctx.take_outgoing();
        ctx.add_response_at(
            &[0],
            0,
            ResponseStatus::Ok,
            br#"{"jsonrpc":"2.0","id":2,"error":{"code":-32602,"message":"bad address"}}"#,
        )
        .unwrap();

        assert_eq!(ctx.advance(), ExecState::Success);
        assert_eq!(ctx.call_status(0), CallStatus::Failed(ErrorKind::InvalidParameter));
        let err = ctx.check_response_error(0).unwrap_err();
        assert_eq!(err.message, "bad address");
    }

    #[test]
    fn test_batch_isolates_failing_call() {
        let client = Client::new();
        client.register(Actions::RPC_HANDLE, Arc::new(EchoHandler));
        let mut ctx = RequestContext::new(
            &client,
            r#"[{"method":"test_echo","params":[1]},{"method":"net_unknown","params":[]},{"method":"test_echo","params":[3]}]"#,
        )
        .unwrap();

        assert_eq!(ctx.advance(), ExecState::Success);
        assert_eq!(ctx.call_status(0), CallStatus::Ok);
        assert_eq!(ctx.call_status(1), CallStatus::Failed(ErrorKind::UnsupportedMethod));
        assert_eq!(ctx.call_status(2), CallStatus::Ok);

        let response = ctx.response_value().unwrap();
        assert_eq!(response.as_array().unwrap().len(), 3);
        assert_eq!(response[2]["result"], json!([3]));
        assert_eq!(response[1]["error"]["code"], json!(-32601));
    }

    #[test]
    fn test_chain_id_is_inherited_by_sub_requests() {
        let client = forwarding_client();
        client.register(Actions::RPC_HANDLE, Arc::new(BalanceLookup));
        let mut ctx = RequestContext::new(
            &client,
            r#"{"method":"test_balance","params":["0xab"],"in3":{"chainId":100}}"#,
        )
        .unwrap();
        assert_eq!(ctx.chain_id(), 100);

        ctx.advance();
        assert_eq!(ctx.required()[0].chain_id(), 100);
        let outgoing = ctx.take_outgoing();
        assert_eq!(outgoing[0].chain_id, 100);
        assert_eq!(client.chain_id(), 1);
    }

    #[test]
    fn test_signature_is_cached_per_message_and_account() {
        let client = Client::new();
        let signer = Arc::new(ScriptedSigner::answering("scripted", vec![5u8; 65]));
        client.register(Actions::SIGN, signer.clone());
        let mut ctx = RequestContext::new(&client, r#"{"method":"m","params":[]}"#).unwrap();

        let account = [1u8; 20];
        let spec = SignatureSpec::keccak(b"payload", &account);
        assert_eq!(ctx.require_signature(&spec), Resolution::Ready(vec![5u8; 65]));
        assert_eq!(ctx.require_signature(&spec), Resolution::Ready(vec![5u8; 65]));
        assert_eq!(signer.calls(), 1);

        let other = [2u8; 20];
        ctx.require_signature(&SignatureSpec::keccak(b"payload", &other));
        assert_eq!(signer.calls(), 2);
    }

    #[test]
    fn test_declining_signers_fall_back_to_remote() {
        let client = Client::new();
        client.register(Actions::SIGN, Arc::new(ScriptedSigner::declining("elsewhere")));
        let mut ctx = RequestContext::new(&client, r#"{"method":"m","params":[]}"#).unwrap();
        let account = [3u8; 20];
        let spec = SignatureSpec::keccak(b"msg", &account);

        assert!(ctx.require_signature(&spec).is_blocked());
        assert!(ctx.require_signature(&spec).is_blocked());
        assert_eq!(ctx.required_len(), 1);

        let child = &ctx.required()[0];
        assert_eq!(child.kind(), RequestKind::Sign);
        assert_eq!(child.method(0), Some("sign_ec_hash"));
        assert_eq!(
            child.calls()[0]["params"],
            json!([to_hex_prefixed(b"msg"), to_hex_prefixed(&account), 0, 1])
        );
    }

    #[test]
    fn test_short_remote_signature_is_rejected() {
        let client = Client::new();
        let mut ctx = RequestContext::new(&client, r#"{"method":"m","params":[]}"#).unwrap();
        let account = [3u8; 20];
        let spec = SignatureSpec::keccak(b"msg", &account);

        ctx.require_signature(&spec);
        ctx.add_response_at(&[0], 0, ResponseStatus::Ok, &[1u8; 64]).unwrap();
        match ctx.require_signature(&spec) {
            Resolution::Failed(err) => assert_eq!(err.message, "no data to sign"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failing_signer_stops_dispatch() {
        let client = Client::new();
        let later = Arc::new(ScriptedSigner::answering("later", vec![1u8; 65]));
        client.register(Actions::SIGN, Arc::new(ScriptedSigner::failing("broken")));
        client.register(Actions::SIGN, later.clone());
        let mut ctx = RequestContext::new(&client, r#"{"method":"m","params":[]}"#).unwrap();

        let account = [3u8; 20];
        let result = ctx.require_signature(&SignatureSpec::keccak(b"msg", &account));
        assert!(matches!(result, Resolution::Failed(_)));
        assert_eq!(later.calls(), 0);
        assert_eq!(ctx.required_len(), 0);
    }

    #[test]
    fn test_send_transaction_spawns_a_single_sign_request() {
        let client = forwarding_client();
        client.register(Actions::RPC_HANDLE, Arc::new(TransactionHandler::new()));
        let request = json!({
            "id": 7,
            "method": "eth_sendTransaction",
            "params": [{ "from": to_hex_prefixed(&[0xaa; 20]), "to": "0x01" }],
        });
        let mut ctx = RequestContext::new(&client, &request.to_string()).unwrap();

        for _ in 0..5 {
            assert_eq!(ctx.advance(), ExecState::Waiting);
        }
        assert_eq!(ctx.required_len(), 1);
        assert_eq!(ctx.required()[0].method(0), Some("sign_ec_hash"));
        assert_eq!(ctx.state(), ContextState::WaitingToSend);

        let outgoing = ctx.take_outgoing();
        assert_eq!(outgoing.len(), 1);
        ctx.add_response_at(&outgoing[0].path, 0, ResponseStatus::Ok, &[0x22; 65])
            .unwrap();

        assert_eq!(ctx.advance(), ExecState::Waiting);
        assert_eq!(ctx.required_len(), 1);
        assert_eq!(ctx.required()[0].method(0), Some("eth_sendRawTransaction"));

        for _ in 0..3 {
            ctx.advance();
        }
        assert_eq!(ctx.required_len(), 1);

        let outgoing = ctx.take_outgoing();
        assert_eq!(outgoing.len(), 1);
        let payload: Value = serde_json::from_str(&outgoing[0].payload).unwrap();
        let raw = payload["params"][0].as_str().unwrap();
        assert!(raw.ends_with(&"22".repeat(65)));

        let id = payload["id"].clone();
        let reply = json!({"jsonrpc": "2.0", "id": id, "result": "0xabc"}).to_string();
        ctx.add_response_at(&outgoing[0].path, 0, ResponseStatus::Ok, reply.as_bytes())
            .unwrap();
        assert_eq!(ctx.advance(), ExecState::Success);
        assert_eq!(
            ctx.response_value().unwrap(),
            json!({"id": 7, "jsonrpc": "2.0", "result": "0xabc"})
        );
    }

    #[test]
    fn test_marker_dedup_reuses_structurally_equal_child() {
        let client = forwarding_client();
        let mut ctx = RequestContext::new(&client, r#"{"method":"m","params":[]}"#).unwrap();

        let params = vec![json!("0x01")];
        assert!(ctx
            .require_sub_request("eth_sendRawTransaction", params.clone(), None, DedupMode::Structural)
            .is_blocked());
        assert!(ctx
            .require_sub_request("eth_sendRawTransaction", params.clone(), None, DedupMode::Marker)
            .is_blocked());
        assert!(ctx
            .require_sub_request("eth_sendRawTransaction", params, None, DedupMode::Marker)
            .is_blocked());
        assert_eq!(ctx.required_len(), 1);

        assert!(ctx
            .require_sub_request("eth_sendRawTransaction", vec![json!("0x02")], None, DedupMode::Marker)
            .is_blocked());
        assert_eq!(ctx.required_len(), 2);
    }

    #[test]
    fn test_sub_request_bound_by_pending_limit() {
        let mut config = ClientConfig::default();
        config.max_pending = 1;
        let client = Client::from_config(config).unwrap();
        let mut ctx = RequestContext::new(&client, r#"{"method":"m","params":[]}"#).unwrap();

        match ctx.send_sub_request("eth_blockNumber", vec![], None) {
            Resolution::Failed(err) => {
                assert_eq!(err.kind, ErrorKind::ResourceExhausted);
                assert!(err.message.starts_with("Invalid request!:"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(client.pending(), 1);
    }

    #[test]
    fn test_errors_reach_log_error_plugins_and_init_runs_once() {
        let client = Client::new();
        let observer = Arc::new(RecordingPlugin::new("observer"));
        client.register(Actions::INIT | Actions::LOG_ERROR, observer.clone());

        let mut first = RequestContext::new(&client, r#"{"method":"m","params":[]}"#).unwrap();
        let _second = RequestContext::new(&client, r#"{"method":"m","params":[]}"#).unwrap();
        first.set_error(ErrorKind::RemoteError, "node unreachable");
        first.set_error(ErrorKind::RemoteError, "fetch block");

        assert_eq!(observer.init_calls(), 1);
        assert_eq!(
            observer.logged_errors(),
            vec!["node unreachable".to_string(), "fetch block:node unreachable".to_string()]
        );
    }

    #[test]
    fn test_dropping_parent_releases_children() {
        let client = forwarding_client();
        client.register(Actions::RPC_HANDLE, Arc::new(BalanceLookup));
        {
            let mut ctx =
                RequestContext::new(&client, r#"{"method":"test_balance","params":["0x1"]}"#)
                    .unwrap();
            ctx.advance();
            assert_eq!(client.pending(), 2);
        }
        assert_eq!(client.pending(), 0);
    }
}
