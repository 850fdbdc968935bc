//! Walks the structural index and skip-map to recognize, in strict field
//! order, the five keyed arrays that make up one transaction.

use crate::index::StructuralIndex;
use crate::skipmap::SkipMap;

const K_READONLY: &[u8] = b"\"readonly\":";
const K_WRITABLE: &[u8] = b"\"writable\":";
const K_POST_TOKEN: &[u8] = b"\"postTokenBalances\":";
const K_PRE_TOKEN: &[u8] = b"\"preTokenBalances\":";
const K_ACCOUNT_KEYS: &[u8] = b"\"accountKeys\":";

/// The five byte-slice views that describe one transaction's array fields.
/// All five are populated together; a partial set is never produced.
#[derive(Debug, Clone, Copy)]
pub struct TxKeyViews<'a> {
    pub readonly: &'a [u8],
    pub writable: &'a [u8],
    pub post_token_balances: &'a [u8],
    pub pre_token_balances: &'a [u8],
    pub account_keys: &'a [u8],
}

#[derive(Debug, Default, Clone, Copy)]
struct PartialTx<'a> {
    readonly: Option<&'a [u8]>,
    writable: Option<&'a [u8]>,
    post_token_balances: Option<&'a [u8]>,
    pre_token_balances: Option<&'a [u8]>,
    account_keys: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Readonly,
    Writable,
    PostToken,
    PreToken,
    AccountKeys,
}

/// Walk `index` over `buf`, pairing `[` positions with the preceding key
/// literal, and return one `TxKeyViews` per completed transaction in input
/// order.
///
/// The key order `readonly, writable, postTokenBalances, preTokenBalances,
/// accountKeys` is a fixed external contract (see design notes): seeing
/// `readonly` always starts a fresh transaction and resets the state
/// machine; any other key seen out of turn is ignored, leaving the machine
/// where it was.
pub fn locate_transactions<'a>(index: &StructuralIndex, skip: &SkipMap, buf: &'a [u8]) -> Vec<TxKeyViews<'a>> {
    let mut out = Vec::new();
    let mut expect = Expect::Readonly;
    let mut current = PartialTx::default();

    for i in 0..index.len() {
        let pos = index.get(i);
        if buf[pos] != b'[' {
            continue;
        }

        let close = skip.get(i);
        if close == 0 {
            continue;
        }

        if matches_key(buf, pos, K_READONLY) {
            current = PartialTx::default();
            current.readonly = Some(view_between(index, buf, i, close));
            expect = Expect::Writable;
        } else if expect == Expect::Writable && matches_key(buf, pos, K_WRITABLE) {
            current.writable = Some(view_between(index, buf, i, close));
            expect = Expect::PostToken;
        } else if expect == Expect::PostToken && matches_key(buf, pos, K_POST_TOKEN) {
            current.post_token_balances = Some(view_between(index, buf, i, close));
            expect = Expect::PreToken;
        } else if expect == Expect::PreToken && matches_key(buf, pos, K_PRE_TOKEN) {
            current.pre_token_balances = Some(view_between(index, buf, i, close));
            expect = Expect::AccountKeys;
        } else if expect == Expect::AccountKeys && matches_key(buf, pos, K_ACCOUNT_KEYS) {
            current.account_keys = Some(view_between(index, buf, i, close));
            if let Some(views) = finish(current) {
                out.push(views);
            }
            expect = Expect::Readonly;
        }
    }

    out
}

fn finish(tx: PartialTx<'_>) -> Option<TxKeyViews<'_>> {
    Some(TxKeyViews {
        readonly: tx.readonly?,
        writable: tx.writable?,
        post_token_balances: tx.post_token_balances?,
        pre_token_balances: tx.pre_token_balances?,
        account_keys: tx.account_keys?,
    })
}

/// Byte-exact match of `key` immediately preceding `bracket_pos`, with no
/// tolerance for intervening whitespace. Requires at least one byte before
/// the key itself (`bracket_pos > key.len()`, strictly), matching the
/// reference scanner's bound check -- a key starting at buffer offset 0
/// is refused even if the bytes otherwise match.
fn matches_key(buf: &[u8], bracket_pos: usize, key: &[u8]) -> bool {
    bracket_pos > key.len() && &buf[bracket_pos - key.len()..bracket_pos] == key
}

/// The inclusive `[...]` slice for the array opened at index `open_idx` and
/// closed at index `close_idx` in `index`.
fn view_between<'a>(index: &StructuralIndex, buf: &'a [u8], open_idx: usize, close_idx: usize) -> &'a [u8] {
    let start = index.get(open_idx);
    let end = index.get(close_idx);
    &buf[start..=end]
}
