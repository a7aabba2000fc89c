//! Hardened memory for secret values.
//!
//! Private scalars handled by this crate pass through a number of buffers on their way to and from
//! the token: APDU bodies, decoded responses, and the keys handed back to the caller. Once freed,
//! ordinary heap memory keeps its old contents until something else overwrites it, and the
//! compiler is free to drop a plain "write zeroes" loop that is never read back. This module wraps
//! Sodium's [secure memory functions](https://doc.libsodium.org/memory_management) so that:
//!
//! * key types returned to the caller live in guarded, locked memory which is wiped on free, and
//! * transient buffers can be cleared in a way the optimiser will not remove.

use crate::{require_init, Card25519Error};
use libsodium_sys as sodium;
use std::alloc::Layout;
use std::ptr::NonNull;

/// Creates a hardened buffer type, for storing secret data (keys, shared secrets).
///
/// `hardened_buffer!(Name(Size))` creates a fixed-size array-like type `Name` whose `Size` bytes
/// are allocated with Sodium's guarded allocator, so they will not be swapped to disk and are
/// zeroed when the value is dropped. The type implements `AsRef<[u8; Size]>`, `AsMut`, `Deref`,
/// `DerefMut`, `Debug` (which does not print the contents), `TryFrom<&[u8]>`, and a constant-time
/// `PartialEq`.
macro_rules! hardened_buffer {
    ( $( $(#[$metadata:meta])* $vis:vis $name:ident($size:expr)$(;)? )* ) => {
        $(
            $(#[$metadata])*
            $vis struct $name {
                ptr: std::ptr::NonNull<[u8; $size]>,
                _marker: std::marker::PhantomData<[u8; $size]>,
            }

            impl $name {
                pub const LENGTH: usize = $size as usize;

                /// Create a new instance of this type, filled with all zeroes.
                pub fn new_empty() -> Result<Self, $crate::Card25519Error> {
                    let mut ptr = unsafe {
                        // SAFETY: This allocates enough memory for a `[u8; $size]`, outside of
                        // Rust's memory management. It is freed exactly once, in `drop`, and a
                        // pointer to it is never handed out, only references tied to `self`.
                        $crate::mem::malloc::<[u8; $size]>()?
                    };

                    unsafe {
                        // SAFETY: `ptr` was allocated above for a `[u8; $size]`, and any bit
                        // pattern is a valid `[u8; $size]`, so writing zeroes through it is sound.
                        $crate::mem::clear(ptr.as_mut())?;
                    }

                    Ok(Self {
                        ptr,
                        _marker: std::marker::PhantomData,
                    })
                }

                /// Zero the contents of the buffer, in such a way that the compiler will not
                /// optimise away the operation.
                ///
                /// This is automatically done when the buffer is dropped.
                pub fn zero(&mut self) -> Result<(), $crate::Card25519Error> {
                    $crate::mem::clear(self.as_mut())
                }

                /// Create a new instance of the same type, copying the contents of this buffer.
                pub fn try_clone(&self) -> Result<Self, $crate::Card25519Error> {
                    let mut new_buf = Self::new_empty()?;
                    new_buf.copy_from_slice(self.as_ref());
                    Ok(new_buf)
                }
            }

            impl Drop for $name {
                fn drop(&mut self) {
                    unsafe {
                        // SAFETY: `self.ptr` was allocated in `new_empty` using Sodium's allocator,
                        // and `drop` runs at most once, so this frees it exactly once. Sodium wipes
                        // the region before releasing it.
                        $crate::mem::free(self.ptr);
                    }
                }
            }

            impl TryFrom<&[u8]> for $name {
                type Error = $crate::Card25519Error;

                fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
                    if buf.len() != $size {
                        return Err(Self::Error::IncorrectSliceLength($size, buf.len()));
                    }

                    let mut new = Self::new_empty()?;
                    new.copy_from_slice(buf);
                    Ok(new)
                }
            }

            impl std::convert::AsMut<[u8; $size]> for $name {
                fn as_mut(&mut self) -> &mut [u8; $size] {
                    unsafe {
                        // SAFETY: The backing memory is valid and initialised for the lifetime of
                        // the struct, and the returned reference borrows `self`.
                        self.ptr.as_mut()
                    }
                }
            }

            impl std::convert::AsRef<[u8; $size]> for $name {
                fn as_ref(&self) -> &[u8; $size] {
                    unsafe {
                        // SAFETY: The backing memory is valid and initialised for the lifetime of
                        // the struct, and the returned reference borrows `self`.
                        self.ptr.as_ref()
                    }
                }
            }

            impl std::fmt::Debug for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&format!("{}([u8; {}])", stringify!($name), $size))
                }
            }

            impl std::ops::Deref for $name {
                type Target = [u8; $size];

                fn deref(&self) -> &Self::Target {
                    self.as_ref()
                }
            }

            impl std::ops::DerefMut for $name {
                fn deref_mut(&mut self) -> &mut Self::Target {
                    self.as_mut()
                }
            }

            impl std::cmp::PartialEq<Self> for $name {
                fn eq(&self, other: &Self) -> bool {
                    $crate::mem::eq(self.as_ref(), other.as_ref()).unwrap_or(false)
                }
            }

            impl std::cmp::Eq for $name {}
        )*
    };
}

pub(crate) use hardened_buffer;

/// Allocate sufficient hardened memory to store a value of type `T`.
///
/// # Safety
/// The returned memory is uninitialised and lives outside of Rust's memory management. It must be
/// initialised before it is read, and released exactly once with [`free`].
pub(crate) unsafe fn malloc<T>() -> Result<NonNull<T>, Card25519Error> {
    require_init()?;

    // Sodium places the allocation directly before a guard page, so padding the size to a
    // multiple of the alignment keeps the start of the region aligned.
    let layout = Layout::new::<T>().pad_to_align();
    let ptr = sodium::sodium_malloc(layout.size()) as *mut T;

    NonNull::new(ptr).ok_or(Card25519Error::MemoryManagement)
}

/// Free memory previously allocated with [`malloc`].
///
/// # Safety
/// `ptr` must come from [`malloc`], must not have been freed already, and must not be used again
/// afterwards. Sodium aborts the process if it detects that the region's canary was overwritten.
pub(crate) unsafe fn free<T>(ptr: NonNull<T>) {
    sodium::sodium_free(ptr.as_ptr() as *mut libc::c_void)
}

/// Constant time test for equality of two slices.
///
/// For a given input length, the time taken to compare the slices is always the same. Always
/// returns false if the slices are not of the same length.
pub(crate) fn eq(a: &[u8], b: &[u8]) -> Result<bool, Card25519Error> {
    require_init()?;

    if a.len() != b.len() {
        return Ok(false);
    }

    let comparison_result = unsafe {
        // SAFETY: Both pointers refer to `a.len()` readable bytes, as we checked the slices have
        // the same length above. Neither slice is modified.
        sodium::sodium_memcmp(
            a.as_ptr() as *const libc::c_void,
            b.as_ptr() as *const libc::c_void,
            a.len(),
        )
    };

    Ok(comparison_result == 0)
}

/// Zero the contents of `buf`, in a way the compiler will not remove.
pub(crate) fn clear(buf: &mut [u8]) -> Result<(), Card25519Error> {
    require_init()?;

    unsafe {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes, and all zeroes is a valid
        // representation of a `u8` slice.
        sodium::sodium_memzero(buf.as_mut_ptr() as *mut libc::c_void, buf.len());
    }

    Ok(())
}

/// Test whether `buf` is filled entirely with zeroes, in constant-time for a specific length.
pub(crate) fn is_zero(buf: &[u8]) -> Result<bool, Card25519Error> {
    require_init()?;

    let comparison_result = unsafe {
        // SAFETY: `buf` is valid for reads of `buf.len()` bytes.
        sodium::sodium_is_zero(buf.as_ptr(), buf.len())
    };

    Ok(comparison_result != 0)
}

#[cfg(test)]
mod tests {
    use super::{clear, eq, free, is_zero, malloc};
    use crate::{random, Card25519Error};
    use std::ptr::NonNull;

    hardened_buffer! {
        TestKey(32);
    }

    #[test]
    fn malloc_allocates_and_free_deallocates() -> Result<(), Card25519Error> {
        unsafe {
            let mut ptr_a: NonNull<[u8; 32]> = malloc()?;
            let mut ptr_b: NonNull<[u8; 1 << 12]> = malloc()?;

            random::fill_random(ptr_a.as_mut())?;
            random::fill_random(ptr_b.as_mut())?;

            free(ptr_a);
            free(ptr_b);
        }

        Ok(())
    }

    #[test]
    fn eq_tests() -> Result<(), Card25519Error> {
        let mut buf_a = [0; 64];
        let mut buf_b = [0; 64];

        random::fill_random(&mut buf_a)?;
        buf_b.copy_from_slice(&buf_a);
        assert!(eq(&buf_a, &buf_b)?);
        assert!(!eq(&buf_a[..32], &buf_b[..33])?);

        buf_b[0] ^= 1;
        assert!(!eq(&buf_a, &buf_b)?);
        assert!(eq(&buf_a[1..], &buf_b[1..])?);

        Ok(())
    }

    #[test]
    fn clear_and_is_zero() -> Result<(), Card25519Error> {
        for _ in 0..100 {
            let mut buf = [0u8; 32];
            assert!(is_zero(&buf)?);
            random::fill_random(&mut buf)?;
            buf[0] |= 1;
            assert!(!is_zero(&buf)?);
            clear(&mut buf)?;
            assert!(is_zero(&buf)?);
        }

        Ok(())
    }

    #[test]
    fn hardened_buffer_behaviour() -> Result<(), Card25519Error> {
        let empty = TestKey::new_empty()?;
        assert!(is_zero(&empty[..])?);

        let mut key = TestKey::try_from(&[0x42u8; 32][..])?;
        assert_eq!(&key[..], &[0x42; 32]);
        assert_eq!(format!("{:?}", key), "TestKey([u8; 32])");

        let copy = key.try_clone()?;
        assert_eq!(key, copy);

        key.zero()?;
        assert_eq!(key, empty);
        assert_ne!(key, copy);

        assert_eq!(
            TestKey::try_from(&[0u8; 31][..]),
            Err(Card25519Error::IncorrectSliceLength(32, 31))
        );

        Ok(())
    }
}
