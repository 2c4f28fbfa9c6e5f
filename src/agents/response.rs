//! 响应语法解析
//!
//! 模型回复按固定语法扫描三类可选标签：
//! - `<thinking> ... </thinking>`：推理文本（trim 后返回）
//! - `<tool name="IDENT" args='JSON_OBJECT' />`：一次工具调用，每条回复最多识别一个
//! - `<code> ... </code>`（Producer）或 `<feedback> ... </feedback>`（Critic）：最终结果
//!
//! 手写单趟扫描而非正则：同名标签取首个出现，未闭合的块标签按缺失处理（解析缺失不是错误，
//! 对应字段为空串）；tool 标签结构残缺或 args 非合法 JSON 对象则是本步的致命错误。
//! 若 tool 标签与结果标签同时出现，调用方以 tool 为准（模型仍在过程中，尚未定稿）。

use serde_json::Value;

use crate::core::AgentError;

/// 从一条回复中解析出的工具调用
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool: String,
    pub args: Value,
}

/// 一条回复的解析结果：推理、可选工具调用、结果文本
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub reasoning: String,
    pub invocation: Option<ToolInvocation>,
    pub result: String,
}

/// 结果标签名：Producer 用 code，Critic 用 feedback
#[derive(Debug, Clone, Copy)]
pub enum ResultTag {
    Code,
    Feedback,
}

impl ResultTag {
    fn name(self) -> &'static str {
        match self {
            ResultTag::Code => "code",
            ResultTag::Feedback => "feedback",
        }
    }
}

/// 解析一条模型回复；标签缺失回落为空串，tool 标签残缺或 args 非法则返回 Err
pub fn parse_response(text: &str, result_tag: ResultTag) -> Result<ParsedResponse, AgentError> {
    let reasoning = extract_block(text, "thinking").unwrap_or_default();
    let invocation = parse_tool_tag(text)?;
    let result = extract_block(text, result_tag.name()).unwrap_or_default();
    Ok(ParsedResponse {
        reasoning,
        invocation,
        result,
    })
}

/// 提取首个 `<tag> ... </tag>` 块；未出现或未闭合返回 None
fn extract_block(text: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;
    Some(text[start..end].trim().to_string())
}

/// 定位首个真正的 tool 标签起点（排除 `<toolbox>` 之类前缀撞名）
fn find_tool_tag(text: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(pos) = text[offset..].find("<tool") {
        let abs = offset + pos;
        let rest = &text[abs + "<tool".len()..];
        if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '/') {
            return Some(abs);
        }
        offset = abs + "<tool".len();
    }
    None
}

/// 在属性区内找终结符 `/>` 的位置；引号内的内容（含 args JSON 里的 `/>` 与 `>`）一律跳过
fn tool_tag_end(rest: &str) -> Result<usize, AgentError> {
    let mut quote: Option<char> = None;
    let mut iter = rest.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '/' => {
                    if matches!(iter.peek(), Some((_, '>'))) {
                        return Ok(i);
                    }
                }
                '>' => {
                    return Err(AgentError::MalformedToolTag(
                        "tool tag is not self-closing".to_string(),
                    ))
                }
                _ => {}
            },
        }
    }
    Err(AgentError::MalformedToolTag(
        "unterminated tool tag".to_string(),
    ))
}

/// 解析首个自闭合 tool 标签；无标签返回 Ok(None)
fn parse_tool_tag(text: &str) -> Result<Option<ToolInvocation>, AgentError> {
    let Some(start) = find_tool_tag(text) else {
        return Ok(None);
    };
    let rest = &text[start + "<tool".len()..];
    let end = tool_tag_end(rest)?;
    let attrs = &rest[..end];

    let name = extract_attr(attrs, "name").ok_or_else(|| {
        AgentError::MalformedToolTag("tool tag missing name attribute".to_string())
    })?;

    // args 属性缺失按空对象处理，必需参数的校验留给工具自身
    let args = match extract_attr(attrs, "args") {
        Some(raw) => {
            let value: Value = serde_json::from_str(&raw)
                .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, raw)))?;
            if !value.is_object() {
                return Err(AgentError::JsonParseError(format!(
                    "tool args must be a JSON object: {}",
                    raw
                )));
            }
            value
        }
        None => serde_json::json!({}),
    };

    Ok(Some(ToolInvocation { tool: name, args }))
}

/// 提取 `key="value"` 或 `key='value'` 形式的属性值
fn extract_attr(attrs: &str, key: &str) -> Option<String> {
    let pat = format!("{}=", key);
    let idx = attrs.find(&pat)? + pat.len();
    let rest = &attrs[idx..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let inner = &rest[quote.len_utf8()..];
    let end = inner.find(quote)?;
    Some(inner[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thinking_and_code() {
        let parsed =
            parse_response("<thinking>A</thinking><code>X</code>", ResultTag::Code).unwrap();
        assert_eq!(parsed.reasoning, "A");
        assert_eq!(parsed.result, "X");
        assert!(parsed.invocation.is_none());
    }

    #[test]
    fn test_feedback_tag() {
        let parsed = parse_response(
            "<thinking>B</thinking><feedback>LGTM [APPROVED]</feedback>",
            ResultTag::Feedback,
        )
        .unwrap();
        assert_eq!(parsed.reasoning, "B");
        assert_eq!(parsed.result, "LGTM [APPROVED]");
    }

    #[test]
    fn test_no_tags_is_parse_miss_not_error() {
        let parsed = parse_response("plain text, no tags at all", ResultTag::Code).unwrap();
        assert_eq!(parsed.reasoning, "");
        assert_eq!(parsed.result, "");
        assert!(parsed.invocation.is_none());
    }

    #[test]
    fn test_tool_tag_with_args() {
        let text = r#"<thinking>need the file</thinking>
<tool name="fs" args='{"operation":"writeFile","path":"/a","content":"hi"}' />"#;
        let parsed = parse_response(text, ResultTag::Code).unwrap();
        let inv = parsed.invocation.unwrap();
        assert_eq!(inv.tool, "fs");
        assert_eq!(inv.args["operation"], "writeFile");
        assert_eq!(inv.args["path"], "/a");
        assert_eq!(inv.args["content"], "hi");
    }

    #[test]
    fn test_tool_tag_without_args_defaults_to_empty_object() {
        let parsed = parse_response(r#"<tool name="fs" />"#, ResultTag::Code).unwrap();
        let inv = parsed.invocation.unwrap();
        assert_eq!(inv.tool, "fs");
        assert_eq!(inv.args, serde_json::json!({}));
    }

    #[test]
    fn test_tool_and_code_both_present() {
        // 两者并存时由调用方按 tool 优先处理，解析层两个字段都给出
        let text = r#"<tool name="fs" args='{"operation":"readFile","path":"a"}' /><code>early</code>"#;
        let parsed = parse_response(text, ResultTag::Code).unwrap();
        assert!(parsed.invocation.is_some());
        assert_eq!(parsed.result, "early");
    }

    #[test]
    fn test_malformed_args_json_is_fatal() {
        let err = parse_response(r#"<tool name="fs" args='{broken' />"#, ResultTag::Code)
            .unwrap_err();
        assert!(matches!(err, AgentError::JsonParseError(_)));
    }

    #[test]
    fn test_non_object_args_is_fatal() {
        let err =
            parse_response(r#"<tool name="fs" args='[1,2]' />"#, ResultTag::Code).unwrap_err();
        assert!(matches!(err, AgentError::JsonParseError(_)));
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let err = parse_response(r#"<tool args='{}' />"#, ResultTag::Code).unwrap_err();
        assert!(matches!(err, AgentError::MalformedToolTag(_)));
    }

    #[test]
    fn test_args_containing_self_closing_markup_survive() {
        // content 里带 "<br/>" 时终结符必须取引号外的那一个
        let text = r#"<tool name="fs" args='{"operation":"writeFile","path":"a.html","content":"<br/>"}' />"#;
        let parsed = parse_response(text, ResultTag::Code).unwrap();
        let inv = parsed.invocation.unwrap();
        assert_eq!(inv.tool, "fs");
        assert_eq!(inv.args["operation"], "writeFile");
        assert_eq!(inv.args["path"], "a.html");
        assert_eq!(inv.args["content"], "<br/>");
    }

    #[test]
    fn test_args_containing_angle_bracket_survive() {
        let text = r#"<tool name="fs" args='{"operation":"writeFile","path":"f.js","content":"const f = (a) => a;"}' />"#;
        let parsed = parse_response(text, ResultTag::Code).unwrap();
        let inv = parsed.invocation.unwrap();
        assert_eq!(inv.args["content"], "const f = (a) => a;");
    }

    #[test]
    fn test_non_self_closing_tool_tag_is_malformed() {
        let err = parse_response(r#"<tool name="fs">"#, ResultTag::Code).unwrap_err();
        assert!(matches!(err, AgentError::MalformedToolTag(_)));
    }

    #[test]
    fn test_unterminated_tool_tag_is_malformed() {
        let err = parse_response(r#"<tool name="fs" args='{}'"#, ResultTag::Code).unwrap_err();
        assert!(matches!(err, AgentError::MalformedToolTag(_)));
    }

    #[test]
    fn test_unclosed_thinking_is_parse_miss() {
        let parsed = parse_response("<thinking>never closed", ResultTag::Code).unwrap();
        assert_eq!(parsed.reasoning, "");
    }

    #[test]
    fn test_duplicate_tags_first_wins() {
        let parsed = parse_response(
            "<thinking>first</thinking><thinking>second</thinking><code>one</code><code>two</code>",
            ResultTag::Code,
        )
        .unwrap();
        assert_eq!(parsed.reasoning, "first");
        assert_eq!(parsed.result, "one");
    }

    #[test]
    fn test_toolbox_prefix_not_a_tool_tag() {
        let parsed = parse_response("<toolbox>stuff</toolbox>", ResultTag::Code).unwrap();
        assert!(parsed.invocation.is_none());
    }
}
