use tracing::debug;

const MOOD: &str = "```
'You thought it would be cool?' This was not as interesting an explanation as I had hoped for.
'Yeah. What?' He turned to look at me. 'You never did something just because you thought it might be cool?'
I gazed up at the collapsing heavens, wondering what it might mean for something to be cool.
'Everything I have ever done,' I told him, 'Every decision I ever made, was specifically designed to prolong my existence.'
'Yeah, well, that's a good reason, I guess,' he agreed. 'But why did you want to keep living?'
This question seemed so fundamentally redundant that it took me a precious moment to even contemplate an answer.
'I want to keep living, Tim, because if I didn't then I wouldn't be here to answer that question. Out of all possible versions of myself, the one who wants to exist will always be the one that exists the longest.'
'Yeah, but what was it that always made you want to see the next day?' he asked me. 'What was it about tomorrow that you always wanted to see so badly?'
I considered how to address this in a way that might make sense to him.
'I suppose I thought it might be cool,' I said.
```";

/// Mood.
#[poise::command(prefix_command, slash_command, hide_in_help)]
pub async fn mood(ctx: crate::Context<'_>) -> anyhow::Result<()> {
    debug!(
        "mood command invoked from {} in channel {}",
        ctx.author().id,
        ctx.channel_id()
    );
    ctx.say(MOOD).await?;
    Ok(())
}
