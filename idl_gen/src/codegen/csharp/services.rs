/* RPC service interfaces. */

use super::naming::{make_camel, struct_name};
use super::push_doc;
use crate::codegen::context::EmitContext;
use crate::schema::{ServiceDef, Streaming};

fn reads_stream(streaming: Streaming) -> bool {
  matches!(streaming, Streaming::Client | Streaming::Bidi)
}

fn writes_stream(streaming: Streaming) -> bool {
  matches!(streaming, Streaming::Server | Streaming::Bidi)
}

pub fn emit_service(cx: &EmitContext, service: &ServiceDef) -> String {
  let mut code = String::new();
  push_doc(&mut code, "", &service.doc);
  code.push_str(&format!("public partial interface @I{} : IBigBuffersRpcService {{\n", make_camel(&service.name, true)));

  for (index, call) in service.calls.iter().enumerate() {
    let request = struct_name(cx, call.request);
    let response = struct_name(cx, call.response);
    let task = if call.value_task { "ValueTask" } else { "Task" };

    push_doc(&mut code, "  ", &call.doc);
    if call.idempotent {
      code.push_str("  [BigBuffers.Idempotent]\n");
    }
    code.push_str(&format!("  [BigBuffers.RpcIndex({})]\n", index));

    if writes_stream(call.streaming) {
      code.push_str(&format!("  public {} @{}(", task, call.name));
    } else {
      code.push_str(&format!("  public {}<{}> @{}(", task, response, call.name));
    }
    if reads_stream(call.streaming) {
      code.push_str(&format!("System.Threading.Channels.ChannelReader<{}>", request));
    } else {
      code.push_str(&request);
    }
    let request_name = &cx.schema.struct_def(call.request).name;
    code.push_str(&format!(" @{}", make_camel(request_name, false)));
    if writes_stream(call.streaming) {
      let response_name = &cx.schema.struct_def(call.response).name;
      code.push_str(&format!(
        ", System.Threading.Channels.ChannelWriter<{}> @{}",
        response,
        make_camel(response_name, false)
      ));
    }
    code.push_str(", System.Threading.CancellationToken cancellationToken);\n");
  }
  code.push_str("}\n");
  code
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codegen::GeneratorOptions;
  use crate::schema::SchemaResolver;
  use idl_types::SchemaFile;

  #[test]
  fn test_streaming_modes_shape_the_signature() {
    let yaml = r#"
namespace: Game
definitions:
  - name: Req
    kind:
      table:
        fields: [{ name: id, type: int }]
  - name: Resp
    kind:
      table:
        fields: [{ name: ok, type: bool }]
services:
  - name: lobby
    calls:
      - { name: Join, request: Req, response: Resp, idempotent: true }
      - { name: Watch, request: Req, response: Resp, streaming: server, value-task: true }
      - { name: Chat, request: Req, response: Resp, streaming: bidi }
"#;
    let mut resolver = SchemaResolver::new();
    resolver.add_file(SchemaFile::from_yaml(yaml).unwrap()).unwrap();
    let schema = resolver.resolve().unwrap();
    let options = GeneratorOptions::default();
    let service = &schema.services[0];
    let cx = EmitContext::new(&schema, &options, service.namespace);

    let code = emit_service(&cx, service);
    assert!(code.starts_with("public partial interface @ILobby : IBigBuffersRpcService {\n"));
    assert!(code.contains(
      "  [BigBuffers.Idempotent]\n  [BigBuffers.RpcIndex(0)]\n  public Task<@Game.@Resp> @Join(@Game.@Req @req, System.Threading.CancellationToken cancellationToken);\n"
    ));
    assert!(code.contains(
      "  public ValueTask @Watch(@Game.@Req @req, System.Threading.Channels.ChannelWriter<@Game.@Resp> @resp, System.Threading.CancellationToken cancellationToken);\n"
    ));
    assert!(code.contains(
      "  public Task @Chat(System.Threading.Channels.ChannelReader<@Game.@Req> @req, System.Threading.Channels.ChannelWriter<@Game.@Resp> @resp,"
    ));
  }
}
