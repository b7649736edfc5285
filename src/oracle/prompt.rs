//! Classification prompt construction.
//!
//! Every oracle receives the same instruction set: classify one Arabic
//! utterance as an edit command or plain content, and answer with a single
//! JSON object in the command wire shape. The document tail travels in the
//! user message as disambiguation context.

/// System prompt describing the command JSON schema.
///
/// The schema mirrors `EditCommand`'s wire names exactly — the reply parser
/// keys on `isCommand`/`commandType`/`action` to recognize the object.
pub fn system_prompt() -> String {
    r#"أنت مصنف أوامر لمحرر نصوص عربي يعمل بالصوت. صنف كلام المستخدم إما كأمر تحرير أو كنص يُضاف إلى المستند.

أجب بكائن JSON واحد فقط، بدون أي شرح خارجه، بهذا الشكل:
{
  "isCommand": true أو false,
  "commandType": "insert" | "delete" | "replace" | "format" | "control" | "none",
  "action": "وصف قصير للعملية",
  "target": "النص المستهدف، أو start/end/all/last/selection",
  "content": "النص المراد إدراجه",
  "replacement": "النص البديل لأوامر الاستبدال",
  "position": "before" | "after" | "start" | "end" | "replace",
  "confidence": رقم بين 0 و 1,
  "explanation": "سبب التصنيف"
}

أمثلة:
- "احذف كلمة خطأ" → حذف، target "خطأ"
- "اكتب بسم الله في البداية" → إدراج، position "start"
- "استبدل القاهرة بدمشق" → استبدال
- "توقف عن الاستماع" → تحكم
- كلام عادي بلا فعل أمر → isCommand false والنص كاملا في content"#
        .to_string()
}

/// User message carrying the document-tail context and the utterance.
pub fn user_message(text: &str, context: &str) -> String {
    if context.is_empty() {
        format!("النص المنطوق: {text}")
    } else {
        format!("آخر المستند الحالي:\n{context}\n\nالنص المنطوق: {text}")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
