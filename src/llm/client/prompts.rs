//! Default prompts for the two extraction queries.
//!
//! Both templates take the document text through the `{content}` placeholder.

/// Default prompt for the registry office name.
pub const DEFAULT_OFFICE_PROMPT: &str = r#"次のOCRテキストは不動産登記の書類です。書類の冒頭に記載されている「登記所の名前」だけを抜き出してください。

出力ルール：
- 出力は登記所名のみ（例：「大阪法務局」「大津地方法務局東近江支局」）
- 説明文、記号、接頭語、接尾語は付けない
- 出力は必ず1行

【テキスト開始】
{content}
【テキスト終了】"#;

/// Default prompt for the inheritance/merger transfer address list.
pub const DEFAULT_ADDRESSES_PROMPT: &str = r#"次のテキストは不動産登記の受付帳をOCRで読み取ったものです。登記の目的が「所有権移転相続・法人合併」または「所有権移転相続法人合併」となっている行を探し、その行に書かれた不動産の所在（例：「東近江市佐野町801 外2」）をすべて抜き出してください。

出力ルール：
- 対象は「所有権移転相続・法人合併」または「所有権移転相続法人合併」と記載された行だけ
- 抜き出すのは登記対象の所在の部分だけ（「既)土地 〇〇市〇〇町〇〇番地 外〇」など、受付番号は含めない）
- 同じ所在が複数回出てきても、出てきた回数だけ出力する
- 1行に1件、所在だけを出力する
- 番号、記号、見出し、説明文は出力しない

【テキスト開始】
{content}
【テキスト終了】"#;
