//! Tests for error handling

use layoutdb_core::error::{NameKind, TypeDbError, TypeDbResult};
use layoutdb_core::memory::MemoryError;
use layoutdb_core::types::Address;

#[test]
fn test_name_not_found_display()
{
    let error = TypeDbError::NameNotFound {
        kind: NameKind::Field,
        name: "Thread::_osthread".to_string(),
    };
    let message = format!("{}", error);
    assert_eq!(message, "field not found: Thread::_osthread");

    let error = TypeDbError::NameNotFound {
        kind: NameKind::LongConstant,
        name: "markWord::age_mask".to_string(),
    };
    assert!(format!("{}", error).starts_with("long constant not found"));
}

#[test]
fn test_duplicate_errors_display()
{
    let error = TypeDbError::DuplicateField {
        owner: "JavaThread".to_string(),
        field: "_threadObj".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("JavaThread"));
    assert!(message.contains("_threadObj"));

    let error = TypeDbError::DuplicateType("Klass".to_string());
    assert!(format!("{}", error).contains("Klass"));
}

#[test]
fn test_direction_errors_display()
{
    assert_eq!(format!("{}", TypeDbError::StaticField("_count".to_string())), "Field _count is static");
    assert_eq!(
        format!("{}", TypeDbError::InstanceField("_state".to_string())),
        "Field _state is not static"
    );
}

#[test]
fn test_memory_error_is_transparent()
{
    let memory_err = MemoryError::UnmappedAddress {
        address: Address::new(0xdead_0000),
    };
    let error: TypeDbError = memory_err.into();

    assert_eq!(format!("{}", error), format!("{}", memory_err));
    assert_eq!(error.memory_error(), Some(&memory_err));
    assert!(TypeDbError::AlreadySet("jint type".to_string()).memory_error().is_none());
}

#[test]
fn test_unaligned_error_mentions_alignment()
{
    let error = MemoryError::UnalignedAddress {
        address: Address::new(0x1002),
        alignment: 4,
    };
    let message = format!("{}", error);
    assert!(message.contains("0x0000000000001002"));
    assert!(message.contains('4'));
}

#[test]
fn test_result_type()
{
    fn returns_result() -> TypeDbResult<i32>
    {
        Ok(42)
    }

    fn returns_error() -> TypeDbResult<i32>
    {
        Err(TypeDbError::MissingCollaborator("remote memory"))
    }

    assert_eq!(returns_result().unwrap(), 42);
    assert!(returns_error().is_err());
}

#[test]
fn test_io_error_conversion()
{
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "libjvm.so");
    let error: TypeDbError = io_err.into();

    match error {
        TypeDbError::Io(_) => {
            // Expected
        }
        _ => panic!("Expected Io variant"),
    }
}
