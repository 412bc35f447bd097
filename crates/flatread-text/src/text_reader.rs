use flatread_wire::FlatError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decodes the text encoding of a flat buffer from a parsed value tree.
///
/// The accessors mirror the binary `Reader`: absent keys resolve to the
/// caller's default, nested objects and arrays go back to the caller's
/// decode callbacks. Schema code written against both readers therefore
/// produces the same objects from either encoding.
///
/// A key that is missing and a key whose value is `null` are treated the
/// same way: absent.
///
/// ```
/// use flatread_text::TextReader;
///
/// let reader = TextReader::open(r#"{ "version": 3, "subgraphs": [] }"#)?;
/// let root = reader.root();
/// let version: u32 = reader.value(root.get("version"), 0)?;
/// let description: String = reader.value(root.get("description"), String::new())?;
/// assert_eq!((version, description.as_str()), (3, ""));
/// # Ok::<(), flatread_text::FlatError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TextReader {
    root: Value,
}

/// The value if it is present and not `null`.
fn present(obj: Option<&Value>) -> Option<&Value> {
    obj.filter(|value| !value.is_null())
}

/// The elements of an array value; absent input is an empty slice.
fn elements<'v>(obj: Option<&'v Value>, kind: &'static str) -> Result<&'v [Value], FlatError> {
    match present(obj) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => {
            tracing::debug!(kind, found = %other, "non-array value passed to array accessor");
            Err(FlatError::InvalidArray { kind })
        }
    }
}

fn convert<T: DeserializeOwned>(value: &Value) -> Result<T, FlatError> {
    T::deserialize(value).map_err(|e| FlatError::InvalidValue(e.to_string()))
}

impl TextReader {
    /// Parse `text` and bind a reader to the resulting tree.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidText`] if `text` is not valid JSON.
    pub fn open(text: &str) -> Result<Self, FlatError> {
        let root = serde_json::from_str(text).map_err(|e| FlatError::InvalidText(e.to_string()))?;
        tracing::trace!(len = text.len(), "text reader bound");
        Ok(Self::from_value(root))
    }

    /// Bind a reader to an already-parsed tree.
    #[must_use]
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// The root object.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Convert `obj` to `T`, or return `default` when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidValue`] if `obj` is present but does not
    /// convert to `T`.
    pub fn value<T: DeserializeOwned>(
        &self,
        obj: Option<&Value>,
        default: T,
    ) -> Result<T, FlatError> {
        present(obj).map_or(Ok(default), convert)
    }

    /// Decode a nested object through `decode`; `None` when absent.
    ///
    /// # Errors
    ///
    /// Whatever `decode` returns.
    pub fn object<'v, T, F>(
        &self,
        obj: Option<&'v Value>,
        decode: F,
    ) -> Result<Option<T>, FlatError>
    where
        F: FnOnce(&Self, &'v Value) -> Result<T, FlatError>,
    {
        present(obj).map(|value| decode(self, value)).transpose()
    }

    /// The elements of an array, borrowed from the tree. Absent input is an
    /// empty slice.
    ///
    /// # Errors
    ///
    /// Returns [`FlatError::InvalidArray`] if `obj` is present but not an
    /// array.
    pub fn array<'v>(&self, obj: Option<&'v Value>) -> Result<&'v [Value], FlatError> {
        elements(obj, "value")
    }

    /// An array of numbers (or other plain values) converted element-wise
    /// to `T`. Absent input is an empty `Vec`.
    ///
    /// # Errors
    ///
    /// - [`FlatError::InvalidArray`] if `obj` is present but not an array.
    /// - [`FlatError::InvalidValue`] if an element does not convert to `T`.
    pub fn typed_array<T: DeserializeOwned>(
        &self,
        obj: Option<&Value>,
    ) -> Result<Vec<T>, FlatError> {
        elements(obj, "typed")?.iter().map(convert).collect()
    }

    /// An array of objects, each decoded through `decode`. Absent input is
    /// an empty `Vec`.
    ///
    /// # Errors
    ///
    /// - [`FlatError::InvalidArray`] if `obj` is present but not an array.
    /// - Whatever `decode` returns for any element.
    pub fn object_array<'v, T, F>(
        &self,
        obj: Option<&'v Value>,
        mut decode: F,
    ) -> Result<Vec<T>, FlatError>
    where
        F: FnMut(&Self, &'v Value) -> Result<T, FlatError>,
    {
        elements(obj, "object")?
            .iter()
            .map(|value| decode(self, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reader() -> TextReader {
        TextReader::from_value(json!({
            "version": 3,
            "name": "mobilenet",
            "shape": [1, 224, 224, 3],
            "scale": [0.5, 1],
            "nothing": null,
            "tensor": { "rank": 4 },
            "tensors": [{ "rank": 1 }, { "rank": 2 }],
            "flag": true,
        }))
    }

    #[test]
    fn value_present_and_absent() {
        let r = reader();
        let root = r.root();
        assert_eq!(r.value::<u32>(root.get("version"), 0).unwrap(), 3);
        assert_eq!(r.value::<u32>(root.get("missing"), 7).unwrap(), 7);
        assert_eq!(r.value::<u32>(root.get("nothing"), 9).unwrap(), 9);
        assert!(r.value::<bool>(root.get("flag"), false).unwrap());
    }

    #[test]
    fn value_of_wrong_type_is_invalid() {
        let r = reader();
        let result = r.value::<u32>(r.root().get("name"), 0);
        assert!(matches!(result, Err(FlatError::InvalidValue(_))));
    }

    #[test]
    fn object_decodes_through_callback() {
        let r = reader();
        let root = r.root();
        let rank = r
            .object(root.get("tensor"), |r, obj| r.value::<u32>(obj.get("rank"), 0))
            .unwrap();
        assert_eq!(rank, Some(4));

        let missing = r.object(root.get("missing"), |_, _| Ok(1)).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn arrays_borrow_and_convert() {
        let r = reader();
        let root = r.root();
        assert_eq!(r.array(root.get("shape")).unwrap().len(), 4);
        assert_eq!(
            r.typed_array::<i32>(root.get("shape")).unwrap(),
            vec![1, 224, 224, 3]
        );
        // Integers widen into float arrays.
        assert_eq!(
            r.typed_array::<f32>(root.get("scale")).unwrap(),
            vec![0.5, 1.0]
        );
    }

    #[test]
    fn absent_arrays_are_empty() {
        let r = reader();
        let root = r.root();
        assert!(r.array(root.get("missing")).unwrap().is_empty());
        assert!(r.typed_array::<u8>(root.get("nothing")).unwrap().is_empty());
        let objects = r.object_array(root.get("missing"), |_, _| Ok(())).unwrap();
        assert!(objects.is_empty());
    }

    #[test]
    fn non_array_input_is_rejected() {
        let r = reader();
        let root = r.root();
        assert_eq!(
            r.array(root.get("version")),
            Err(FlatError::InvalidArray { kind: "value" })
        );
        assert_eq!(
            r.typed_array::<u8>(root.get("name")),
            Err(FlatError::InvalidArray { kind: "typed" })
        );
        assert_eq!(
            r.object_array(root.get("tensor"), |_, _| Ok(())),
            Err(FlatError::InvalidArray { kind: "object" })
        );
    }

    #[test]
    fn object_array_decodes_each_element() {
        let r = reader();
        let ranks = r
            .object_array(r.root().get("tensors"), |r, obj| {
                r.value::<u32>(obj.get("rank"), 0)
            })
            .unwrap();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn open_rejects_malformed_text() {
        assert!(matches!(
            TextReader::open("{ \"version\": "),
            Err(FlatError::InvalidText(_))
        ));
        let reader = TextReader::open("{}").unwrap();
        assert_eq!(reader.root(), &json!({}));
    }
}
