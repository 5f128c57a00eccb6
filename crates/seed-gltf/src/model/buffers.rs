//! Buffer ownership, buffer view creation and buffer merging.

use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{debug, trace};

use super::ModelRoot;
use crate::error::{GltfError, Result};
use crate::memory::align4;
use crate::schema::{Buffer, BufferTarget, BufferView};

/// Bytes backing one buffer, tagged with who owns them.
///
/// `Shared` content may alias memory the caller still holds, so it is never
/// written in place; [`BufferData::make_mut`] copies it into `Owned` first.
#[derive(Clone, PartialEq, Eq)]
pub enum BufferData {
    /// Reference-counted bytes that may be shared with the caller.
    Shared(Arc<[u8]>),
    /// Bytes owned exclusively by the model.
    Owned(Vec<u8>),
}

impl BufferData {
    /// The bytes.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            BufferData::Shared(bytes) => bytes,
            BufferData::Owned(bytes) => bytes,
        }
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// True if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// True when the bytes may alias caller memory.
    pub fn is_shared(&self) -> bool {
        matches!(self, BufferData::Shared(_))
    }

    /// Copy shared bytes into owned storage. Returns true if a copy was made.
    pub fn isolate(&mut self) -> bool {
        match self {
            BufferData::Shared(bytes) => {
                *self = BufferData::Owned(bytes.to_vec());
                true
            }
            BufferData::Owned(_) => false,
        }
    }

    /// Writable bytes, isolating shared content first.
    pub fn make_mut(&mut self) -> &mut Vec<u8> {
        self.isolate();
        match self {
            BufferData::Owned(bytes) => bytes,
            BufferData::Shared(_) => unreachable!("buffer was isolated above"),
        }
    }
}

impl AsRef<[u8]> for BufferData {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::fmt::Debug for BufferData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferData::Shared(bytes) => write!(f, "Shared({} bytes)", bytes.len()),
            BufferData::Owned(bytes) => write!(f, "Owned({} bytes)", bytes.len()),
        }
    }
}

impl ModelRoot {
    /// Number of buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Bytes of buffer `index`.
    pub fn buffer(&self, index: usize) -> Option<&BufferData> {
        self.buffers.get(index)
    }

    /// Readable bytes of buffer `index`.
    pub fn buffer_bytes(&self, index: usize) -> Result<&[u8]> {
        self.buffers
            .get(index)
            .map(BufferData::as_slice)
            .ok_or(GltfError::OutOfRange {
                index,
                count: self.buffers.len(),
            })
    }

    /// Writable bytes of buffer `index`.
    ///
    /// Shared content is copied into owned storage first so caller memory is
    /// never modified.
    pub fn buffer_bytes_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        let count = self.buffers.len();
        let buffer = self
            .buffers
            .get_mut(index)
            .ok_or(GltfError::OutOfRange { index, count })?;
        if buffer.is_shared() {
            debug!(buffer = index, "isolating shared buffer before write");
        }
        Ok(buffer.make_mut().as_mut_slice())
    }

    /// Register caller-provided bytes, reusing the buffer already holding the
    /// same allocation.
    pub fn use_buffer(&mut self, bytes: Arc<[u8]>) -> usize {
        let existing = self.buffers.iter().position(|buffer| match buffer {
            BufferData::Shared(shared) => Arc::ptr_eq(shared, &bytes),
            BufferData::Owned(_) => false,
        });
        if let Some(index) = existing {
            return index;
        }
        self.push_buffer(BufferData::Shared(bytes))
    }

    /// Append a new buffer owned by the model.
    pub fn create_buffer(&mut self, bytes: Vec<u8>) -> usize {
        self.push_buffer(BufferData::Owned(bytes))
    }

    pub(crate) fn push_buffer(&mut self, data: BufferData) -> usize {
        self.document.buffers.push(Buffer {
            byte_length: data.len(),
            ..Buffer::default()
        });
        self.buffers.push(data);
        self.buffers.len() - 1
    }

    /// Find or create a view over `[byte_offset, byte_offset + byte_length)`
    /// of `buffer`.
    ///
    /// `byte_length` of `None` extends the view to the end of the buffer.
    /// Views with the same buffer, range, stride and target are shared.
    pub fn use_buffer_view(
        &mut self,
        buffer: usize,
        byte_offset: usize,
        byte_length: Option<usize>,
        byte_stride: Option<usize>,
        target: Option<BufferTarget>,
    ) -> Result<usize> {
        let buffer_len = self.buffer_bytes(buffer)?.len();
        if byte_offset > buffer_len {
            return Err(GltfError::Bounds(format!(
                "view offset {} is past the end of buffer {} ({} bytes)",
                byte_offset, buffer, buffer_len
            )));
        }
        let byte_length = byte_length.unwrap_or(buffer_len - byte_offset);
        if byte_offset + byte_length > buffer_len {
            return Err(GltfError::Bounds(format!(
                "view [{}, {}) exceeds buffer {} ({} bytes)",
                byte_offset,
                byte_offset + byte_length,
                buffer,
                buffer_len
            )));
        }

        let existing = self.document.buffer_views.iter().position(|view| {
            view.buffer == buffer
                && view.byte_offset == byte_offset
                && view.byte_length == byte_length
                && view.byte_stride == byte_stride
                && view.target == target
        });
        if let Some(index) = existing {
            return Ok(index);
        }

        let mut view = BufferView::new(buffer, byte_offset, byte_length);
        view.byte_stride = byte_stride;
        view.target = target;
        self.document.buffer_views.push(view);
        Ok(self.document.buffer_views.len() - 1)
    }

    /// Bytes covered by buffer view `index`.
    pub fn view_bytes(&self, index: usize) -> Result<&[u8]> {
        let view = self
            .document
            .buffer_views
            .get(index)
            .ok_or(GltfError::OutOfRange {
                index,
                count: self.document.buffer_views.len(),
            })?;
        let bytes = self.buffer_bytes(view.buffer)?;
        view.byte_offset
            .checked_add(view.byte_length)
            .and_then(|end| bytes.get(view.byte_offset..end))
            .ok_or_else(|| {
                GltfError::Bounds(format!(
                    "bufferViews[{}] of {} bytes at offset {} exceeds buffer {} ({} bytes)",
                    index,
                    view.byte_length,
                    view.byte_offset,
                    view.buffer,
                    bytes.len()
                ))
            })
    }

    /// Writable bytes covered by buffer view `index`.
    pub fn view_bytes_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        let view = self
            .document
            .buffer_views
            .get(index)
            .ok_or(GltfError::OutOfRange {
                index,
                count: self.document.buffer_views.len(),
            })?;
        let (buffer, start, length) = (view.buffer, view.byte_offset, view.byte_length);
        let bytes = self.buffer_bytes_mut(buffer)?;
        let len = bytes.len();
        start
            .checked_add(length)
            .and_then(|end| bytes.get_mut(start..end))
            .ok_or_else(|| {
                GltfError::Bounds(format!(
                    "bufferViews[{}] of {} bytes at offset {} exceeds buffer {} ({} bytes)",
                    index, length, start, buffer, len
                ))
            })
    }

    /// Copy every buffer that may alias caller memory into owned storage.
    pub fn isolate_memory(&mut self) {
        let mut copied = 0;
        for buffer in &mut self.buffers {
            if buffer.isolate() {
                copied += 1;
            }
        }
        if copied > 0 {
            debug!(buffers = copied, "isolated shared buffers");
        }
    }

    /// Pack the bytes of every buffer view into a single buffer.
    pub fn merge_buffers(&mut self) -> Result<()> {
        self.merge_buffers_with_limit(usize::MAX)
    }

    /// Pack the bytes of every buffer view into as few buffers as possible,
    /// starting a new buffer whenever `max_size` would be exceeded.
    ///
    /// Views are placed largest first, each starting on a 4-byte boundary.
    /// A view larger than `max_size` gets a buffer of its own. Buffers no
    /// view refers to are dropped. A model with a single buffer is left as is.
    pub fn merge_buffers_with_limit(&mut self, max_size: usize) -> Result<()> {
        if self.buffers.len() <= 1 {
            return Ok(());
        }

        let mut order: Vec<usize> = (0..self.document.buffer_views.len()).collect();
        order.sort_by_key(|&i| Reverse(self.document.buffer_views[i].byte_length));

        let mut merged: Vec<Vec<u8>> = Vec::new();
        let mut placements = vec![(0usize, 0usize); order.len()];
        for &view_index in &order {
            let bytes = self.view_bytes(view_index)?;
            let fits = merged
                .last()
                .map(|current| {
                    current.is_empty() || align4(current.len() + bytes.len()) <= max_size
                })
                .unwrap_or(false);
            if !fits {
                merged.push(Vec::new());
            }
            let target = merged.len() - 1;
            let current = &mut merged[target];
            let offset = current.len();
            current.extend_from_slice(bytes);
            current.resize(align4(current.len()), 0);
            placements[view_index] = (target, offset);
            trace!(view = view_index, buffer = target, offset, "placed buffer view");
        }

        debug!(
            from = self.buffers.len(),
            to = merged.len(),
            views = order.len(),
            "merged buffers"
        );

        for (view, (buffer, offset)) in self.document.buffer_views.iter_mut().zip(placements) {
            view.buffer = buffer;
            view.byte_offset = offset;
        }
        self.document.buffers.clear();
        self.buffers.clear();
        for bytes in merged {
            self.push_buffer(BufferData::Owned(bytes));
        }
        Ok(())
    }

    /// Move every in-memory image into a buffer view of its own.
    ///
    /// Afterwards the view is the image's only content; call
    /// [`merge_buffers`](Self::merge_buffers) to pack the new buffers.
    pub fn merge_images(&mut self) -> Result<()> {
        let mut internalized = 0;
        for index in 0..self.images.len() {
            let Some(image) = self.images[index].take() else {
                continue;
            };
            let buffer = self.create_buffer(image.bytes().to_vec());
            let view = self.use_buffer_view(buffer, 0, None, None, None)?;
            let schema = &mut self.document.images[index];
            schema.buffer_view = Some(view);
            schema.uri = None;
            schema.mime_type = Some(image.mime_type().to_string());
            internalized += 1;
        }
        if internalized > 0 {
            debug!(images = internalized, "internalized images into buffer views");
        }
        Ok(())
    }
}
