use pipesh::{tokenize_str, Token};
use proptest::prelude::*;

proptest! {
    #[test]
    fn quoted_text_survives(text in "[^\"\\\\]{0,40}") {
        let input = format!("\"{text}\"\n");
        let tokens = tokenize_str(&input).unwrap();
        prop_assert_eq!(tokens[0].clone(), Token::QuotedString(text.into()));
        prop_assert_eq!(tokens[1].clone(), Token::EndOfLine);
    }

    #[test]
    fn plain_words_split_on_blanks(words in prop::collection::vec("[a-zA-Z0-9_./-]{1,12}", 1..8)) {
        let input = format!("{}\n", words.join(" \t "));
        let tokens = tokenize_str(&input).unwrap();
        let texts: Vec<String> = tokens
            .iter()
            .filter_map(|t| t.text().map(|text| text.to_string_lossy().into_owned()))
            .collect();
        prop_assert_eq!(texts, words);
    }

    #[test]
    fn word_bytes_are_preserved(bytes in prop::collection::vec(0x80u8..=0xff, 1..16)) {
        use std::os::unix::ffi::OsStrExt;

        let mut input = bytes.clone();
        input.push(b'\n');
        let mut tokenizer = pipesh::Tokenizer::from_read(&input[..]);
        let token = tokenizer.next_token().unwrap();
        prop_assert_eq!(token.text().map(|text| text.as_bytes().to_vec()), Some(bytes));
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..256)) {
        pipesh::fuzz_parse_bytes(&data);
    }
}
