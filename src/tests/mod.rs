use crate::models::CommandRecord;
use crate::parser::MarkdownParser;

mod analysis;
mod statistics;

pub(crate) const SAMPLE_SOURCE: &str = "reports/failed.md";

// Test utilities and helpers
pub(crate) struct TestUtils;

impl TestUtils {
    /// Three failed commands in the numbered-section layout: a lock file
    /// mismatch, a missing manifest and a timeout.
    pub fn sample_document() -> &'static str {
        r#"
## 1. Make target: install

**Command:** `make install`
**Source:** /home/test/Makefile
**Type:** make_target
**Status:** ❌ Failed
**Return Code:** 2
**Execution Time:** 1.47s

**Output:**
```
make[1]: Entering directory
poetry install
```

**Error Output:**
```
poetry.lock changed significantly since poetry.lock was last generated
```

**Metadata:**
- **target:** install
- **original_command:** make install

---

## 2. NPM script: test

**Command:** `npm run test`
**Source:** /home/test/package.json
**Type:** npm_script
**Status:** ❌ Failed
**Return Code:** 254
**Execution Time:** 2.79s

**Output:**
```
```

**Error Output:**
```
npm error code ENOENT
npm error syscall open
npm error path /home/test/package.json
```

**Metadata:**
- **script_name:** test
- **script_command:** echo test

---

## 3. Make target: timeout-test

**Command:** `make timeout-test`
**Source:** /home/test/Makefile
**Type:** make_target
**Status:** ❌ Failed
**Return Code:** -1
**Execution Time:** 60.0s

**Error Output:**
```
Command timed out after 60 seconds
```

**Metadata:**
- **target:** timeout-test
"#
    }

    pub fn sample_records() -> Vec<CommandRecord> {
        MarkdownParser::new().parse_content(Self::sample_document(), SAMPLE_SOURCE)
    }
}
