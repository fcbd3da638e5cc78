//! Collection commands: LPUSH, HSET, SADD, SETBIT, GETBIT.
//!
//! Each creates its own kind of value on first use. After that the command
//! table's kind check keeps strings and collections apart: a key made by
//! SETBIT is a bitmap and rejects APPEND, and a string rejects SETBIT.

use crate::commands::error::{CommandError, CommandResult};
use crate::commands::handler::{parse_i64, CommandHandler, Invocation};
use crate::protocol::Reply;
use crate::storage::value::{get_bit, set_bit};
use crate::storage::{Entry, Value, ValueKind};
use bytes::Bytes;

/// Bit offsets must stay below 2^32 (bitmaps are capped at 512 MB).
const MAX_BIT_OFFSET: i64 = 1 << 32;

/// Borrows the slot's entry, creating an empty value of `kind` when absent.
fn entry_or_empty(slot: &mut Option<Entry>, kind: ValueKind) -> &mut Entry {
    slot.get_or_insert_with(|| Entry::new(Value::empty(kind)))
}

impl CommandHandler {
    /// LPUSH key value [value ...]
    ///
    /// Values are pushed one at a time onto the head, so the last one named
    /// ends up first.
    pub(crate) fn cmd_lpush(&self, inv: &Invocation<'_>) -> CommandResult {
        let values = &inv.args[1..];

        self.write(inv, inv.key(), |slot| {
            let entry = entry_or_empty(slot, ValueKind::List);
            let list = entry.value.as_list_mut().ok_or(CommandError::WrongType)?;
            for value in values {
                list.push_front(value.clone());
            }
            Ok(Reply::integer(list.len() as i64))
        })
    }

    /// HSET key field value [field value ...]
    ///
    /// Replies with the number of fields that did not exist before.
    pub(crate) fn cmd_hset(&self, inv: &Invocation<'_>) -> CommandResult {
        let pairs = &inv.args[1..];
        if pairs.len() % 2 != 0 {
            return Err(CommandError::arity(inv.spec.name));
        }

        self.write(inv, inv.key(), |slot| {
            let entry = entry_or_empty(slot, ValueKind::Hash);
            let hash = entry.value.as_hash_mut().ok_or(CommandError::WrongType)?;
            let added = pairs
                .chunks_exact(2)
                .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
                .count();
            Ok(Reply::integer(added as i64))
        })
    }

    /// SADD key member [member ...]
    pub(crate) fn cmd_sadd(&self, inv: &Invocation<'_>) -> CommandResult {
        let members = &inv.args[1..];

        self.write(inv, inv.key(), |slot| {
            let entry = entry_or_empty(slot, ValueKind::Set);
            let set = entry.value.as_set_mut().ok_or(CommandError::WrongType)?;
            let added = members.iter().filter(|m| set.insert(Bytes::clone(m))).count();
            Ok(Reply::integer(added as i64))
        })
    }

    /// SETBIT key offset bit
    ///
    /// Replies with the bit's previous value.
    pub(crate) fn cmd_setbit(&self, inv: &Invocation<'_>) -> CommandResult {
        let offset = parse_bit_offset(&inv.args[1])?;
        let on = match inv.args[2].as_ref() {
            b"0" => false,
            b"1" => true,
            _ => return Err(CommandError::InvalidBit),
        };

        self.write(inv, inv.key(), |slot| {
            let entry = entry_or_empty(slot, ValueKind::Bitmap);
            let bits = entry.value.as_bitmap_mut().ok_or(CommandError::WrongType)?;
            Ok(Reply::integer(i64::from(set_bit(bits, offset, on))))
        })
    }

    /// GETBIT key offset
    pub(crate) fn cmd_getbit(&self, inv: &Invocation<'_>) -> CommandResult {
        let offset = parse_bit_offset(&inv.args[1])?;

        self.read(inv, inv.key(), |entry| {
            let bit = match entry {
                Some(entry) => {
                    let bits = entry.value.as_bitmap().ok_or(CommandError::WrongType)?;
                    get_bit(bits, offset)
                }
                None => 0,
            };
            Ok(Reply::integer(i64::from(bit)))
        })
    }
}

fn parse_bit_offset(arg: &[u8]) -> Result<usize, CommandError> {
    match parse_i64(arg) {
        Ok(n) if (0..MAX_BIT_OFFSET).contains(&n) => Ok(n as usize),
        _ => Err(CommandError::InvalidBitOffset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageEngine;
    use std::sync::Arc;

    fn create_handler() -> CommandHandler {
        CommandHandler::new(Arc::new(StorageEngine::new()))
    }

    fn run(handler: &CommandHandler, parts: &[&str]) -> Reply {
        handler.execute_parts(parts)
    }

    #[test]
    fn test_lpush() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["LPUSH", "l", "a"]), Reply::integer(1));
        assert_eq!(run(&handler, &["LPUSH", "l", "b", "c"]), Reply::integer(3));

        let head = handler.storage().view(b"l", |e| {
            let mut value = e.unwrap().value.clone();
            value.as_list_mut().unwrap().front().cloned()
        });
        assert_eq!(head, Some(Bytes::from("c")));
    }

    #[test]
    fn test_hset_counts_new_fields() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["HSET", "h", "f1", "v1"]), Reply::integer(1));
        assert_eq!(
            run(&handler, &["HSET", "h", "f1", "v2", "f2", "v"]),
            Reply::integer(1)
        );
        assert_eq!(
            run(&handler, &["HSET", "h", "f1", "v1", "f2"]),
            Reply::error("ERR wrong number of arguments for 'hset' command")
        );
    }

    #[test]
    fn test_sadd_counts_new_members() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["SADD", "s", "a", "b", "a"]), Reply::integer(2));
        assert_eq!(run(&handler, &["SADD", "s", "b"]), Reply::integer(0));
    }

    #[test]
    fn test_setbit_getbit() {
        let handler = create_handler();
        assert_eq!(run(&handler, &["SETBIT", "b", "7", "1"]), Reply::integer(0));
        assert_eq!(run(&handler, &["SETBIT", "b", "7", "0"]), Reply::integer(1));
        assert_eq!(run(&handler, &["SETBIT", "b", "100", "1"]), Reply::integer(0));
        assert_eq!(run(&handler, &["GETBIT", "b", "100"]), Reply::integer(1));
        assert_eq!(run(&handler, &["GETBIT", "b", "7"]), Reply::integer(0));
        assert_eq!(run(&handler, &["GETBIT", "b", "99999"]), Reply::integer(0));
        assert_eq!(run(&handler, &["GETBIT", "missing", "3"]), Reply::integer(0));
    }

    #[test]
    fn test_setbit_creates_bitmap_not_string() {
        let handler = create_handler();
        run(&handler, &["SETBIT", "b", "1", "1"]);
        assert_eq!(
            run(&handler, &["APPEND", "b", "x"]),
            Reply::from(CommandError::WrongType)
        );
        assert_eq!(run(&handler, &["GET", "b"]), Reply::from(CommandError::WrongType));

        run(&handler, &["SET", "s", "abc"]);
        assert_eq!(
            run(&handler, &["SETBIT", "s", "1", "1"]),
            Reply::from(CommandError::WrongType)
        );
    }

    #[test]
    fn test_setbit_invalid_arguments() {
        let handler = create_handler();
        let bad_offset = Reply::error("ERR bit offset is not an integer or out of range");
        let bad_bit = Reply::error("ERR bit is not an integer or out of range");

        assert_eq!(run(&handler, &["SETBIT", "b", "-1", "1"]), bad_offset);
        assert_eq!(run(&handler, &["SETBIT", "b", "x", "1"]), bad_offset);
        assert_eq!(run(&handler, &["SETBIT", "b", "4294967296", "1"]), bad_offset);
        assert_eq!(run(&handler, &["SETBIT", "b", "1", "2"]), bad_bit);
        assert_eq!(run(&handler, &["GETBIT", "b", "-5"]), bad_offset);
        assert_eq!(run(&handler, &["EXISTS", "b"]), Reply::integer(0));
    }
}
