use picdump_wire::{PayloadBuilder, PayloadCursor};

use crate::error::TypeError;

/// On-disk representation of one scalar.
///
/// ```text
/// ┌─────────┬───────┬──────────────────────────────────────────┐
/// │ Kind    │ Bytes │ Encoding                                 │
/// ├─────────┼───────┼──────────────────────────────────────────┤
/// │ I32     │ 4     │ two's complement, little-endian          │
/// │ F32     │ 4     │ IEEE 754 single, little-endian           │
/// │ F64     │ 8     │ IEEE 754 double, little-endian           │
/// │ Logical │ 4     │ Fortran LOGICAL, non-zero = true         │
/// │ Tag     │ 4     │ blank-padded character code              │
/// │ Text    │ rest  │ the remainder of the chunk, trimmed      │
/// └─────────┴───────┴──────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    I32,
    F32,
    F64,
    Logical,
    Tag,
    Text,
}

impl Kind {
    /// Encoded size of one value, `None` for `Text`.
    #[must_use]
    pub fn width(self) -> Option<usize> {
        match self {
            Self::I32 | Self::F32 | Self::Logical | Self::Tag => Some(4),
            Self::F64 => Some(8),
            Self::Text => None,
        }
    }
}

/// How many values of a field follow each other in the chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Count {
    One,
    Fixed(usize),
    /// Length taken from an i32 field decoded earlier.
    Len(&'static str),
}

/// Condition under which a chunk is present in the stream.
///
/// Predicates look the named field up in the record being built first,
/// then in the enclosing record (the global header for species records).
/// A field that is absent makes the predicate false.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Always,
    IfSet(&'static str),
    IfEq(&'static str, i32),
    IfTag(&'static str, &'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: Kind,
    pub count: Count,
}

/// One chunk of the grammar: the fields packed into it, in write order.
///
/// A chunk without fields is reserved: it is consumed to keep the cursor
/// aligned, and its payload is not interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSpec {
    pub fields: &'static [FieldSpec],
    pub presence: Presence,
}

impl ChunkSpec {
    pub const RESERVED: Self = Self {
        fields: &[],
        presence: Presence::Always,
    };

    /// Name used for this chunk in diagnostics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.fields.first().map_or("reserved", |f| f.name)
    }

    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn is_present(&self, scope: Scope<'_>) -> bool {
        match self.presence {
            Presence::Always => true,
            Presence::IfSet(flag) => matches!(scope.lookup(flag), Some([Value::Logical(true)])),
            Presence::IfEq(field, want) => matches!(scope.lookup(field), Some([Value::I32(v)]) if *v == want),
            Presence::IfTag(field, want) => matches!(scope.lookup(field), Some([Value::Text(v)]) if v == want),
        }
    }

    /// Decode this chunk's payload into `record`.
    ///
    /// A field name that already exists in the record is overwritten, so a
    /// grammar can read the same field several times in a row and keep the
    /// last value.
    ///
    /// # Errors
    ///
    /// [`TypeError::Wire`] when the payload is shorter than the fields
    /// require, [`TypeError::InvalidDimension`] for a negative `Len` count,
    /// [`TypeError::LengthMismatch`] for a `Len` count the remaining payload
    /// cannot hold.
    pub fn read(
        &self,
        cursor: &mut PayloadCursor,
        record: &mut Record,
        outer: Option<&Record>,
    ) -> Result<(), TypeError> {
        for field in self.fields {
            let n = resolve_count(field, Scope { local: record, outer })?;
            if let (Count::Len(_), Some(width)) = (field.count, field.kind.width()) {
                let available = cursor.remaining() / width;
                if n > available {
                    return Err(TypeError::LengthMismatch {
                        field: field.name,
                        expected: n,
                        actual: available,
                    });
                }
            }
            let mut values = Vec::with_capacity(n.min(cursor.remaining()));
            for _ in 0..n {
                values.push(read_value(field.kind, cursor)?);
            }
            record.set(field.name, values);
        }
        Ok(())
    }

    /// Encode this chunk's fields from `record` into a payload.
    ///
    /// # Errors
    ///
    /// [`TypeError::MissingField`] / [`TypeError::FieldKind`] when the record
    /// lacks a field or holds the wrong kind, [`TypeError::LengthMismatch`]
    /// when an array has the wrong length.
    pub fn write(
        &self,
        record: &Record,
        outer: Option<&Record>,
        out: &mut PayloadBuilder,
    ) -> Result<(), TypeError> {
        for field in self.fields {
            let n = resolve_count(field, Scope { local: record, outer })?;
            let values = record.values(field.name)?;
            if values.len() != n {
                return Err(TypeError::LengthMismatch {
                    field: field.name,
                    expected: n,
                    actual: values.len(),
                });
            }
            for value in values {
                write_value(field, value, out)?;
            }
        }
        Ok(())
    }
}

/// Look-up chain used by presence predicates and `Len` counts.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub local: &'a Record,
    pub outer: Option<&'a Record>,
}

impl<'a> Scope<'a> {
    #[must_use]
    pub fn new(local: &'a Record, outer: Option<&'a Record>) -> Self {
        Self { local, outer }
    }

    fn lookup(&self, name: &str) -> Option<&'a [Value]> {
        self.local
            .get(name)
            .or_else(|| self.outer.and_then(|o| o.get(name)))
    }
}

fn resolve_count(field: &FieldSpec, scope: Scope<'_>) -> Result<usize, TypeError> {
    match field.count {
        Count::One => Ok(1),
        Count::Fixed(n) => Ok(n),
        Count::Len(source) => match scope.lookup(source) {
            Some([Value::I32(n)]) => usize::try_from(*n).map_err(|_| TypeError::InvalidDimension {
                field: source,
                value: i64::from(*n),
            }),
            Some(_) => Err(TypeError::FieldKind {
                field: source,
                expected: Kind::I32,
            }),
            None => Err(TypeError::MissingField { field: source }),
        },
    }
}

fn read_value(kind: Kind, cursor: &mut PayloadCursor) -> Result<Value, TypeError> {
    Ok(match kind {
        Kind::I32 => Value::I32(cursor.i32()?),
        Kind::F32 => Value::F32(cursor.f32()?),
        Kind::F64 => Value::F64(cursor.f64()?),
        Kind::Logical => Value::Logical(cursor.logical()?),
        Kind::Tag => Value::Text(cursor.tag()?),
        Kind::Text => Value::Text(cursor.rest_text()),
    })
}

fn write_value(field: &FieldSpec, value: &Value, out: &mut PayloadBuilder) -> Result<(), TypeError> {
    match (field.kind, value) {
        (Kind::I32, Value::I32(v)) => out.i32(*v),
        (Kind::F32, Value::F32(v)) => out.f32(*v),
        (Kind::F64, Value::F64(v)) => out.f64(*v),
        (Kind::Logical, Value::Logical(v)) => out.logical(*v),
        (Kind::Tag, Value::Text(v)) => out.tag(v),
        (Kind::Text, Value::Text(v)) => out.text(v),
        (expected, _) => {
            return Err(TypeError::FieldKind {
                field: field.name,
                expected,
            });
        }
    };
    Ok(())
}

/// A decoded scalar.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    I32(i32),
    F32(f32),
    F64(f64),
    Logical(bool),
    Text(String),
}

/// Values decoded from a sequence of chunks, by field name.
///
/// Insertion order is kept so a record prints in stream order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    entries: Vec<(&'static str, Vec<Value>)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a field.
    pub fn set(&mut self, name: &'static str, values: Vec<Value>) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = values;
        } else {
            self.entries.push((name, values));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_slice())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    /// # Errors
    ///
    /// [`TypeError::MissingField`] if the field was never decoded.
    pub fn values(&self, name: &'static str) -> Result<&[Value], TypeError> {
        self.get(name).ok_or(TypeError::MissingField { field: name })
    }

    fn one(&self, name: &'static str) -> Result<&Value, TypeError> {
        match self.values(name)? {
            [v] => Ok(v),
            other => Err(TypeError::LengthMismatch {
                field: name,
                expected: 1,
                actual: other.len(),
            }),
        }
    }

    /// # Errors
    ///
    /// Missing field, wrong kind, or more than one value.
    pub fn i32(&self, name: &'static str) -> Result<i32, TypeError> {
        match self.one(name)? {
            Value::I32(v) => Ok(*v),
            _ => Err(kind_error(name, Kind::I32)),
        }
    }

    /// # Errors
    ///
    /// Missing field, wrong kind, or more than one value.
    pub fn f64(&self, name: &'static str) -> Result<f64, TypeError> {
        match self.one(name)? {
            Value::F64(v) => Ok(*v),
            _ => Err(kind_error(name, Kind::F64)),
        }
    }

    /// # Errors
    ///
    /// Missing field, wrong kind, or more than one value.
    pub fn logical(&self, name: &'static str) -> Result<bool, TypeError> {
        match self.one(name)? {
            Value::Logical(v) => Ok(*v),
            _ => Err(kind_error(name, Kind::Logical)),
        }
    }

    /// # Errors
    ///
    /// Missing field, wrong kind, or more than one value.
    pub fn text(&self, name: &'static str) -> Result<&str, TypeError> {
        match self.one(name)? {
            Value::Text(v) => Ok(v),
            _ => Err(kind_error(name, Kind::Text)),
        }
    }

    /// Optional scalar: `Ok(None)` when the chunk was not present.
    ///
    /// # Errors
    ///
    /// Wrong kind or more than one value.
    pub fn opt_i32(&self, name: &'static str) -> Result<Option<i32>, TypeError> {
        if self.contains(name) { self.i32(name).map(Some) } else { Ok(None) }
    }

    /// # Errors
    ///
    /// Missing field or a value of another kind.
    pub fn i32_vec(&self, name: &'static str) -> Result<Vec<i32>, TypeError> {
        self.values(name)?
            .iter()
            .map(|v| match v {
                Value::I32(x) => Ok(*x),
                _ => Err(kind_error(name, Kind::I32)),
            })
            .collect()
    }

    /// # Errors
    ///
    /// Missing field, wrong kind, or a length other than `N`.
    pub fn i32_array<const N: usize>(&self, name: &'static str) -> Result<[i32; N], TypeError> {
        fixed(name, self.i32_vec(name)?)
    }

    /// # Errors
    ///
    /// Missing field, wrong kind, or a length other than `N`.
    pub fn f32_array<const N: usize>(&self, name: &'static str) -> Result<[f32; N], TypeError> {
        let values = self
            .values(name)?
            .iter()
            .map(|v| match v {
                Value::F32(x) => Ok(*x),
                _ => Err(kind_error(name, Kind::F32)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        fixed(name, values)
    }

    /// # Errors
    ///
    /// Missing field, wrong kind, or a length other than `N`.
    pub fn f64_array<const N: usize>(&self, name: &'static str) -> Result<[f64; N], TypeError> {
        let values = self
            .values(name)?
            .iter()
            .map(|v| match v {
                Value::F64(x) => Ok(*x),
                _ => Err(kind_error(name, Kind::F64)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        fixed(name, values)
    }

    pub fn put_i32(&mut self, name: &'static str, v: i32) {
        self.set(name, vec![Value::I32(v)]);
    }

    pub fn put_f64(&mut self, name: &'static str, v: f64) {
        self.set(name, vec![Value::F64(v)]);
    }

    pub fn put_logical(&mut self, name: &'static str, v: bool) {
        self.set(name, vec![Value::Logical(v)]);
    }

    pub fn put_text(&mut self, name: &'static str, v: &str) {
        self.set(name, vec![Value::Text(v.to_string())]);
    }

    pub fn put_i32s(&mut self, name: &'static str, v: &[i32]) {
        self.set(name, v.iter().copied().map(Value::I32).collect());
    }

    pub fn put_f32s(&mut self, name: &'static str, v: &[f32]) {
        self.set(name, v.iter().copied().map(Value::F32).collect());
    }

    pub fn put_f64s(&mut self, name: &'static str, v: &[f64]) {
        self.set(name, v.iter().copied().map(Value::F64).collect());
    }
}

fn kind_error(field: &'static str, expected: Kind) -> TypeError {
    TypeError::FieldKind { field, expected }
}

fn fixed<T, const N: usize>(field: &'static str, values: Vec<T>) -> Result<[T; N], TypeError> {
    values.try_into().map_err(|v: Vec<T>| TypeError::LengthMismatch {
        field,
        expected: N,
        actual: v.len(),
    })
}

// ── Grammar constructors ──────────────────────────────────────────────
//
// The grammar tables in `grammar.rs` are built from these so that each
// line of a table reads like the producer's write statement.

#[must_use]
pub const fn field(name: &'static str, kind: Kind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        count: Count::One,
    }
}

#[must_use]
pub const fn array(name: &'static str, kind: Kind, n: usize) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        count: Count::Fixed(n),
    }
}

#[must_use]
pub const fn sized_by(name: &'static str, kind: Kind, source: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        count: Count::Len(source),
    }
}

#[must_use]
pub const fn chunk(fields: &'static [FieldSpec]) -> ChunkSpec {
    ChunkSpec {
        fields,
        presence: Presence::Always,
    }
}

#[must_use]
pub const fn chunk_if(presence: Presence, fields: &'static [FieldSpec]) -> ChunkSpec {
    ChunkSpec { fields, presence }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKED: ChunkSpec = chunk(&[
        field("count", Kind::I32),
        array("xs", Kind::F64, 2),
        field("flag", Kind::Logical),
    ]);

    #[test]
    fn packed_chunk_roundtrips_through_record() {
        let mut record = Record::new();
        record.put_i32("count", 3);
        record.put_f64s("xs", &[1.5, -2.0]);
        record.put_logical("flag", true);

        let mut out = PayloadBuilder::new();
        PACKED.write(&record, None, &mut out).unwrap();
        assert_eq!(out.len(), 4 + 16 + 4);

        let mut decoded = Record::new();
        PACKED
            .read(&mut PayloadCursor::new(out.finish()), &mut decoded, None)
            .unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn repeated_name_keeps_last_value() {
        const REPEATED: ChunkSpec = chunk(&[
            field("a", Kind::Logical),
            field("b", Kind::Logical),
            field("b", Kind::Logical),
        ]);
        let payload = PayloadBuilder::new()
            .logical(true)
            .logical(true)
            .logical(false)
            .finish();
        let mut record = Record::new();
        REPEATED
            .read(&mut PayloadCursor::new(payload), &mut record, None)
            .unwrap();
        assert!(record.logical("a").unwrap());
        assert!(!record.logical("b").unwrap());
        assert_eq!(record.names().count(), 2);
    }

    #[test]
    fn len_count_reads_from_outer_scope() {
        const SIZED: ChunkSpec = chunk(&[sized_by("items", Kind::I32, "n")]);
        let mut outer = Record::new();
        outer.put_i32("n", 2);
        let payload = PayloadBuilder::new().i32(7).i32(9).finish();
        let mut record = Record::new();
        SIZED
            .read(&mut PayloadCursor::new(payload), &mut record, Some(&outer))
            .unwrap();
        assert_eq!(record.i32_vec("items").unwrap(), vec![7, 9]);
    }

    #[test]
    fn negative_len_count_is_rejected() {
        const SIZED: ChunkSpec = chunk(&[sized_by("items", Kind::I32, "n")]);
        let mut record = Record::new();
        record.put_i32("n", -1);
        let empty = PayloadBuilder::new().finish();
        let err = SIZED
            .read(&mut PayloadCursor::new(empty), &mut record, None)
            .unwrap_err();
        assert!(matches!(err, TypeError::InvalidDimension { field: "n", value: -1 }));
    }

    #[test]
    fn len_count_beyond_payload_is_rejected_before_reading() {
        const SIZED: ChunkSpec = chunk(&[sized_by("items", Kind::F64, "n")]);
        let mut record = Record::new();
        record.put_i32("n", i32::MAX);
        let payload = PayloadBuilder::new().f64(1.0).f64(2.0).i32(0).finish();
        let err = SIZED
            .read(&mut PayloadCursor::new(payload), &mut record, None)
            .unwrap_err();
        assert!(matches!(
            err,
            TypeError::LengthMismatch { field: "items", expected: 2_147_483_647, actual: 2 }
        ));
        assert!(record.get("items").is_none());
    }

    #[test]
    fn presence_predicates() {
        let mut record = Record::new();
        record.put_logical("on", true);
        record.put_logical("off", false);
        record.put_i32("mode", 1);
        record.put_text("profile", "y");
        let scope = Scope::new(&record, None);

        assert!(chunk_if(Presence::IfSet("on"), &[]).is_present(scope));
        assert!(!chunk_if(Presence::IfSet("off"), &[]).is_present(scope));
        assert!(!chunk_if(Presence::IfSet("absent"), &[]).is_present(scope));
        assert!(chunk_if(Presence::IfEq("mode", 1), &[]).is_present(scope));
        assert!(!chunk_if(Presence::IfEq("mode", 0), &[]).is_present(scope));
        assert!(chunk_if(Presence::IfTag("profile", "y"), &[]).is_present(scope));
        assert!(!chunk_if(Presence::IfTag("profile", "x"), &[]).is_present(scope));
    }

    #[test]
    fn short_payload_surfaces_as_wire_error() {
        let payload = PayloadBuilder::new().i32(1).finish();
        let mut record = Record::new();
        let err = PACKED
            .read(&mut PayloadCursor::new(payload), &mut record, None)
            .unwrap_err();
        assert!(matches!(err, TypeError::Wire(_)));
    }

    #[test]
    fn typed_getters_check_kind_and_length() {
        let mut record = Record::new();
        record.put_f64s("xs", &[1.0, 2.0]);
        assert!(matches!(
            record.f64_array::<3>("xs"),
            Err(TypeError::LengthMismatch { expected: 3, actual: 2, .. })
        ));
        assert!(matches!(
            record.i32("xs"),
            Err(TypeError::LengthMismatch { .. })
        ));
        assert!(matches!(
            record.i32_vec("xs"),
            Err(TypeError::FieldKind { expected: Kind::I32, .. })
        ));
        assert!(record.opt_i32("nothing").unwrap().is_none());
    }
}
