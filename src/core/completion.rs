//! Turning raw model output into a function body, and the prompt that asks
//! for one.

const PYTHON_FENCE: &str = "```python";
const FENCE: &str = "```";
const MAIN_GUARD: &str = "if __name__ == \"__main__\":";
const EXAMPLE_USAGE: &str = "# Example usage";

/// Wraps a problem prompt in the instruction asking for the body only.
pub fn instruct_prompt(prompt: &str) -> String {
    format!(
        r#"
    # Below is an instruction that describes a task. Write a response that appropriately completes the request.

    ### Instruction:
    Please complete the implementation of the following function **by providing only the code inside the function body**. Do not include the function signature, docstring, tests, or any explanations.

    **Ensure that your code is properly indented to fit within the function body. All code lines should be indented with at least 4 spaces.**

    {prompt}

    ### Response:
    "#
    )
}

/// Extracts the code from a model response: keeps only the first fenced
/// python block if there is one and cuts off any `__main__` guard or example
/// usage trailing the function.
pub fn process_completion(raw: &str) -> String {
    let mut completion = raw.replace('\r', "");

    if let Some(start) = completion.find(PYTHON_FENCE) {
        let block = &completion[start + PYTHON_FENCE.len()..];
        completion = match block.find(FENCE) {
            Some(end) => block[..end].trim_end().to_string(),
            None => {
                tracing::warn!("Completion has an unterminated code fence");
                block.trim_end().to_string()
            }
        };
    }

    for marker in [MAIN_GUARD, EXAMPLE_USAGE] {
        if let Some(pos) = completion.find(marker) {
            completion.truncate(pos);
            completion.truncate(completion.trim_end().len());
        }
    }

    completion
}

pub fn fix_indents(text: &str) -> String {
    text.replace('\t', "    ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_completion_untouched() {
        assert_eq!(process_completion("    return a+b\n"), "    return a+b\n");
    }

    #[test]
    fn test_fenced_block_extracted() {
        let raw = "Here you go:\r\n```python\n    return a+b\n```\nHope it helps";
        assert_eq!(process_completion(raw), "\n    return a+b");
    }

    #[test]
    fn test_unterminated_fence_keeps_rest() {
        let raw = "```python\n    return a+b\n\n";
        assert_eq!(process_completion(raw), "\n    return a+b");
    }

    #[test]
    fn test_trailing_main_and_examples_removed() {
        let raw = "    return a+b\n\nif __name__ == \"__main__\":\n    print(add(1, 2))\n";
        assert_eq!(process_completion(raw), "    return a+b");

        let raw = "    return a+b\n# Example usage\nprint(add(1, 2))\n";
        assert_eq!(process_completion(raw), "    return a+b");
    }

    #[test]
    fn test_fix_indents() {
        assert_eq!(fix_indents("\treturn 1\n\t\tpass"), "    return 1\n        pass");
    }

    #[test]
    fn test_instruct_prompt_embeds_prompt() {
        let prompt = instruct_prompt("def add(a, b):\n");
        assert!(prompt.contains("def add(a, b):\n"));
        assert!(prompt.contains("### Instruction:"));
        assert!(prompt.trim_end().ends_with("### Response:"));
    }
}
